//! Command-line entry point over PillTrack core services.
//!
//! # Responsibility
//! - Log doses and query dosing periods without the mobile shell.
//! - Resolve database/logging settings from flags with env fallback.
//!
//! # Invariants
//! - Every failure exits non-zero with a one-line message on stderr.
//! - Medicines can be addressed by UUID or by case-insensitive name.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use pilltrack_core::config::{DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
use pilltrack_core::db::open_db;
use pilltrack_core::{
    init_logging_from_config, AddEntryOutcome, AddEntryRequest, CoreConfig, Medicine,
    MedicineService, RegistryEntry, RegistryService, RegistryServiceError,
    SqliteMedicineRepository, SqliteRegistryRepository, WidgetService,
};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "pilltrack", version, about = "Track periodic medicine doses")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = DB_PATH_ENV, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, env = LOG_DIR_ENV, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, env = LOG_LEVEL_ENV, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a medicine with its dosing interval.
    AddMedicine {
        #[arg(long)]
        name: String,
        /// Days between doses.
        #[arg(long)]
        interval: u32,
    },
    /// List tracked medicines.
    Medicines,
    /// Log a dose for the period containing DATE (default: today).
    Log {
        medicine: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        not_taken: bool,
        /// Replace an entry already covering the period.
        #[arg(long)]
        overwrite: bool,
    },
    /// Show whether the period containing DATE is covered.
    Status {
        medicine: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List entries between two dates (inclusive).
    History {
        medicine: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Print the widget view for today.
    Widget { medicine: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = resolve_config(&cli);
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| format!("cannot open database: {err}"))?;
    let medicines = MedicineService::new(
        SqliteMedicineRepository::try_new(&conn).map_err(|err| err.to_string())?,
    );
    let registry = RegistryService::new(
        SqliteMedicineRepository::try_new(&conn).map_err(|err| err.to_string())?,
        SqliteRegistryRepository::try_new(&conn).map_err(|err| err.to_string())?,
    );
    let today = Local::now().date_naive();

    match cli.command {
        Command::AddMedicine { name, interval } => {
            let medicine = medicines
                .create_medicine(name, interval)
                .map_err(|err| err.to_string())?;
            println!("{}", describe_medicine(&medicine));
        }
        Command::Medicines => {
            for medicine in medicines.list_medicines().map_err(|err| err.to_string())? {
                println!("{}", describe_medicine(&medicine));
            }
        }
        Command::Log {
            medicine,
            date,
            not_taken,
            overwrite,
        } => {
            let medicine = find_medicine(&medicines, &medicine)?;
            let request = AddEntryRequest {
                medicine_id: medicine.uuid,
                date: date.unwrap_or(today),
                taken: !not_taken,
                overwrite,
            };
            match registry.add_entry(&request, today) {
                Ok(AddEntryOutcome::Inserted(entry)) => {
                    println!("saved {}", describe_entry(&entry));
                }
                Ok(AddEntryOutcome::Replaced { entry, previous }) => {
                    let removed: Vec<String> = previous.iter().map(describe_entry).collect();
                    println!(
                        "replaced {} with {}",
                        removed.join(", "),
                        describe_entry(&entry)
                    );
                }
                Err(RegistryServiceError::Conflict { existing }) => {
                    return Err(format!(
                        "period already logged: {} (use --overwrite to replace)",
                        describe_entry(&existing)
                    ));
                }
                Err(err) => return Err(err.to_string()),
            }
        }
        Command::Status { medicine, date } => {
            let medicine = find_medicine(&medicines, &medicine)?;
            let date = date.unwrap_or(today);
            let status = registry
                .status_for(medicine.uuid, date)
                .map_err(|err| err.to_string())?;
            println!("{} {date} {}", medicine.name, status.as_str());
        }
        Command::History { medicine, from, to } => {
            let medicine = find_medicine(&medicines, &medicine)?;
            let to = to.unwrap_or(today);
            let from = from.unwrap_or_default();
            let entries = registry
                .entries_between(medicine.uuid, from, to)
                .map_err(|err| err.to_string())?;
            for entry in &entries {
                println!("{}", describe_entry(entry));
            }
        }
        Command::Widget { medicine } => {
            let medicine = find_medicine(&medicines, &medicine)?;
            let snapshot = WidgetService::new(registry)
                .snapshot(medicine.uuid, today)
                .map_err(|err| err.to_string())?;
            println!("{}: {}", snapshot.medicine_name, snapshot.status.as_str());
            if let Some(last) = snapshot.last_taken {
                println!("last taken: {last}");
            }
            if let (Some(due), Some(days)) = (snapshot.next_due, snapshot.days_until_due) {
                println!("next due: {due} ({days} day(s))");
            }
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> CoreConfig {
    let mut config = CoreConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config
}

fn find_medicine(
    service: &MedicineService<SqliteMedicineRepository<'_>>,
    key: &str,
) -> Result<Medicine, String> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        return service
            .get_medicine(id)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("medicine not found: {id}"));
    }

    let mut matches: Vec<Medicine> = service
        .list_medicines()
        .map_err(|err| err.to_string())?
        .into_iter()
        .filter(|medicine| medicine.name.eq_ignore_ascii_case(key))
        .collect();
    match matches.len() {
        0 => Err(format!("no medicine named `{key}`")),
        1 => Ok(matches.remove(0)),
        count => Err(format!(
            "{count} medicines are named `{key}`; use the id instead"
        )),
    }
}

fn describe_medicine(medicine: &Medicine) -> String {
    format!(
        "{} {} every {} day(s)",
        medicine.uuid, medicine.name, medicine.interval_days
    )
}

fn describe_entry(entry: &RegistryEntry) -> String {
    let mark = if entry.taken { "taken" } else { "not taken" };
    format!("{} {mark}", entry.date)
}
