//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source observations (`ArchiveObservation`, `OperationalObservation`)
//! - reconciled outputs (`AnomalySeries`, `CombinedSeries`)
//! - run/presentation settings (`ReconcileConfig`, `DashboardConfig`, `YearRange`)

pub mod types;

pub use types::*;
