//! Records Client
//!
//! Paginated read/write access to the records store: events are read from a
//! named view, disbursements are created and then moved to a terminal status.

pub mod airtable;
pub mod types;

pub use airtable::AirtableClient;
pub use types::{Disbursement, DisbursementStatus, DisbursementType, Event, NewDisbursement};

use async_trait::async_trait;

use crate::error::Result;

/// Records store operations used by the pipeline and the preview
#[async_trait]
pub trait RecordsStore: Send + Sync {
    /// Fetch every event in `view`, following the pagination cursor to the end.
    ///
    /// Always starts from the first page.
    async fn list_events(&self, view: &str) -> Result<Vec<Event>>;

    /// Create a disbursement and return it with its store-assigned ids
    async fn create_disbursement(&self, new: &NewDisbursement) -> Result<Disbursement>;

    /// Overwrite `status` and `notes` on an existing disbursement
    async fn update_disbursement_status(
        &self,
        id: &str,
        status: DisbursementStatus,
        notes: &str,
    ) -> Result<()>;
}


#[cfg(test)]
pub use mock::MockRecords;
