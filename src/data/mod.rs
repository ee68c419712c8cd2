//! Upstream data access: fetching and parsing the two source tables.

pub mod archive;
pub mod client;
pub mod operational;

pub use archive::parse_archive;
pub use client::{SourceClient, SourceConfig};
pub use operational::parse_operational;
