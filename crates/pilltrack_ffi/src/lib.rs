//! Flutter bridge surface for PillTrack core.
//!
//! The app and the home-screen widget call into `api`; code generation for the
//! Dart side reads the same module.

pub mod api;
