//! Period reconciliation over a medicine's registry log.
//!
//! # Responsibility
//! - Decide which entries belong to the dosing period around a date.
//! - Answer temporal queries (status, most recent, last taken, ranges).
//!
//! # Invariants
//! - Period window for interval `I` around `date` is `[date-(I-1), date+(I-1)]`.
//! - The most recent entry inside a window is authoritative; recency is
//!   `date`, then `recorded_at`, then `uuid`.
//! - All functions are pure and never mutate the input log.

use crate::model::registry::RegistryEntry;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive date range treated as one dosing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// Builds the window around `date` for an interval of `interval_days`.
    ///
    /// An interval of `0` is treated as `1` (same-day window). Bounds saturate
    /// at the calendar limits supported by `chrono`.
    pub fn around(date: NaiveDate, interval_days: u32) -> Self {
        let reach = Days::new(u64::from(interval_days.max(1) - 1));
        Self {
            start: date.checked_sub_days(reach).unwrap_or(NaiveDate::MIN),
            end: date.checked_add_days(reach).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Reconciled state of one dosing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// Nothing was logged in this period or any earlier one.
    NoDataBefore,
    /// The authoritative entry says the dose was taken.
    Taken,
    /// The authoritative entry says not taken, or the period was missed.
    NotTaken,
}

impl PeriodStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoDataBefore => "no_data_before",
            Self::Taken => "taken",
            Self::NotTaken => "not_taken",
        }
    }
}

/// Returns entries whose date falls inside `window`.
pub fn entries_in_window<'a>(
    entries: &'a [RegistryEntry],
    window: &PeriodWindow,
) -> Vec<&'a RegistryEntry> {
    entries
        .iter()
        .filter(|entry| window.contains(entry.date))
        .collect()
}

/// Returns the authoritative (most recent) entry of a set.
pub fn most_recent<'a, I>(entries: I) -> Option<&'a RegistryEntry>
where
    I: IntoIterator<Item = &'a RegistryEntry>,
{
    entries.into_iter().max_by(|a, b| a.cmp_recency(b))
}

/// Returns the most recent entry of the whole log.
pub fn most_recent_entry(entries: &[RegistryEntry]) -> Option<&RegistryEntry> {
    most_recent(entries)
}

/// Returns the entry already covering the period of `date`, if any.
pub fn find_conflict(
    entries: &[RegistryEntry],
    date: NaiveDate,
    interval_days: u32,
) -> Option<&RegistryEntry> {
    let window = PeriodWindow::around(date, interval_days);
    most_recent(entries_in_window(entries, &window))
}

/// Reconciles the period containing `date`.
pub fn period_status(
    entries: &[RegistryEntry],
    date: NaiveDate,
    interval_days: u32,
) -> PeriodStatus {
    let window = PeriodWindow::around(date, interval_days);
    if let Some(entry) = most_recent(entries_in_window(entries, &window)) {
        return if entry.taken {
            PeriodStatus::Taken
        } else {
            PeriodStatus::NotTaken
        };
    }

    if entries.iter().any(|entry| entry.date < window.start) {
        PeriodStatus::NotTaken
    } else {
        PeriodStatus::NoDataBefore
    }
}

/// Returns the date of the most recent `taken = true` entry.
pub fn last_taken_date(entries: &[RegistryEntry]) -> Option<NaiveDate> {
    most_recent(entries.iter().filter(|entry| entry.taken)).map(|entry| entry.date)
}

/// Returns entries dated within `[from, to]`, ascending by recency.
///
/// Reversed bounds are swapped rather than yielding an empty list.
pub fn entries_between(
    entries: &[RegistryEntry],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<RegistryEntry> {
    let (low, high) = if from <= to { (from, to) } else { (to, from) };
    let mut matched: Vec<RegistryEntry> = entries
        .iter()
        .filter(|entry| low <= entry.date && entry.date <= high)
        .cloned()
        .collect();
    matched.sort_by(|a, b| a.cmp_recency(b));
    matched
}

/// Date the next dose is due: last taken date plus one interval.
pub fn next_due_date(entries: &[RegistryEntry], interval_days: u32) -> Option<NaiveDate> {
    let last = last_taken_date(entries)?;
    last.checked_add_days(Days::new(u64::from(interval_days.max(1))))
}
