//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and period reconciliation into use-case APIs.
//! - Keep UI/FFI/CLI layers decoupled from storage details.

pub mod medicine_service;
pub mod registry_service;
pub mod widget_service;
