//! Gateway HTTP handlers

pub mod dashboard;
pub mod disbursements;
pub mod health;

pub use dashboard::{dashboard, get_stats};
pub use disbursements::{get_preview, trigger_custom_disbursements, trigger_disbursements};
pub use health::health_check;
