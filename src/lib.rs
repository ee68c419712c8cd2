//! `enso-dash` library crate.
//!
//! The binary (`enso`) is a thin wrapper around this library so that:
//!
//! - the fetch/parse/reconcile pipeline is testable without spawning processes
//! - the CLI report and the TUI share one code path
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod series;
pub mod tui;
