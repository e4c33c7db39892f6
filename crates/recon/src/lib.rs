//! `shipcheck-recon` — Module registry vs. shipment reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded grids, returns classified results.
//! No CLI or IO dependencies.

pub mod column;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod extract;
pub mod grid;
pub mod matcher;
pub mod model;
pub mod report;
pub mod stats;
pub mod validate;

pub use config::{ReconConfig, SourceLayout};
pub use engine::{parse_source, run};
pub use error::ReconError;
pub use grid::{Grid, ShipmentSheet, TabularSource};
pub use matcher::ShipmentMatcher;
pub use model::{ParseOutcome, ReconResult, Record, RecordStatus};
