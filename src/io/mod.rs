//! Input/output helpers.
//!
//! - CSV exports of both reconciled tables (`export`)
//! - snapshot JSON read/write (`snapshot`)

pub mod export;
pub mod snapshot;

pub use export::*;
pub use snapshot::*;
