//! Reconciled series: building them (`merge`) and reading them (`view`).

pub mod merge;
pub mod view;

pub use merge::{ReconcileStats, Reconciled, reconcile};
pub use view::{PhaseCounts, find_gaps, overall_bounds};
