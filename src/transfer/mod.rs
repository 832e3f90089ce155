//! Transfer Client
//!
//! One call: move `amount_cents` from one HCB organization to another.
//! Direction is expressed only through source/destination; the amount is never
//! negative.

pub mod hcb;

pub use hcb::HcbClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Body of `POST /organizations/{source}/transfers/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    pub to_organization_id: String,
    pub name: String,
    pub amount_cents: u64,
}

/// Funds-transfer API
#[async_trait]
pub trait TransferApi: Send + Sync {
    /// Move `amount_cents` from `source_org` to `dest_org`
    async fn transfer(
        &self,
        source_org: &str,
        dest_org: &str,
        name: &str,
        amount_cents: u64,
    ) -> Result<()>;
}


#[cfg(test)]
pub use mock::MockTransfers;
