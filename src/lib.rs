//! Daydream Cash Cannon - event disbursement service
//!
//! Reads events with an owed amount from Airtable, records a disbursement row
//! per event, and moves the money through HCB organization transfers.
//!
//! # Modules
//!
//! - [`records`] - Airtable events/disbursements client
//! - [`transfer`] - HCB transfer client
//! - [`pipeline`] - Planning and sequential execution of a run
//! - [`preview`] - Read-only projection of the next run
//! - [`stats`] - Last-run statistics
//! - [`money`] - Dollar/cent conversion and amount parsing
//! - [`gateway`] - axum dashboard with basic auth

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod money;
pub mod pipeline;
pub mod preview;
pub mod records;
pub mod stats;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::{AppConfig, ConfigError};
pub use error::{DisbursementError, Upstream};
pub use pipeline::{DisbursementPipeline, RunResult};
pub use preview::{Preview, PreviewService};
pub use records::{AirtableClient, RecordsStore};
pub use stats::{RunStats, StatsHolder};
pub use transfer::{HcbClient, TransferApi};
