//! Records Store Types
//!
//! Domain types for events and disbursements, plus the Airtable wire shapes
//! they are read from and written to.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Types
// ============================================================================

/// An event (signup) with an amount owed to or from its organization
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Store-assigned record id
    pub id: String,
    /// HCB organization the event belongs to
    pub organization_id: String,
    /// Signed dollars: positive = grant, negative = withdrawal
    pub amount_owed: Decimal,
    /// Free-form secondary identifier
    pub record_id: String,
}

/// Disbursement status
///
/// `Pending` moves exactly once to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisbursementStatus {
    Pending,
    Processed,
    Failed,
}

impl DisbursementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementStatus::Pending => "pending",
            DisbursementStatus::Processed => "processed",
            DisbursementStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DisbursementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Disbursement type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisbursementType {
    /// Positive owed amount, operating org -> event org
    Autogrant,
    /// Negative owed amount, event org -> operating org
    Withdrawal,
    /// Fixed custom amount applied to every event
    Miscellaneous,
}

impl DisbursementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementType::Autogrant => "autogrant",
            DisbursementType::Withdrawal => "withdrawal",
            DisbursementType::Miscellaneous => "miscellaneous",
        }
    }
}

impl fmt::Display for DisbursementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields for a disbursement about to be created
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDisbursement {
    /// Linked event record ids (always exactly one)
    pub associated_event: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: DisbursementStatus,
    pub disbursement_type: DisbursementType,
    pub notes: String,
}

impl NewDisbursement {
    /// A `pending` disbursement for one event
    pub fn pending(
        event_id: &str,
        amount: Decimal,
        disbursement_type: DisbursementType,
        notes: String,
    ) -> Self {
        Self {
            associated_event: vec![event_id.to_string()],
            amount,
            status: DisbursementStatus::Pending,
            disbursement_type,
            notes,
        }
    }
}

/// A disbursement as stored upstream
#[derive(Debug, Clone, PartialEq)]
pub struct Disbursement {
    /// Store-assigned record id (used for updates)
    pub id: String,
    /// Sequential number (used in transfer names)
    pub disbursement_id: u64,
    pub event_id: Option<String>,
    pub amount: Decimal,
    pub status: DisbursementStatus,
    pub disbursement_type: DisbursementType,
    pub notes: String,
}

// ============================================================================
// Airtable Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct EventsPage {
    pub records: Vec<EventRecord>,
    /// Cursor for the next page; absent or empty on the last page
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventRecord {
    pub id: String,
    #[serde(default)]
    pub fields: EventFields,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventFields {
    #[serde(default)]
    pub hcb_event_id: String,
    /// Airtable omits empty number cells
    #[serde(default)]
    pub amount_owed: Decimal,
    #[serde(default)]
    pub record_id: String,
}

impl From<EventRecord> for Event {
    fn from(rec: EventRecord) -> Self {
        Self {
            id: rec.id,
            organization_id: rec.fields.hcb_event_id,
            amount_owed: rec.fields.amount_owed,
            record_id: rec.fields.record_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FieldsBody<T> {
    pub fields: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate<'a> {
    pub status: DisbursementStatus,
    pub notes: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DisbursementRecord {
    pub id: String,
    pub fields: DisbursementFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DisbursementFields {
    pub disbursement_id: u64,
    #[serde(default)]
    pub associated_event: Vec<String>,
    #[serde(default)]
    pub amount: Decimal,
    pub status: DisbursementStatus,
    pub disbursement_type: DisbursementType,
    #[serde(default)]
    pub notes: String,
}

impl From<DisbursementRecord> for Disbursement {
    fn from(rec: DisbursementRecord) -> Self {
        Self {
            id: rec.id,
            disbursement_id: rec.fields.disbursement_id,
            event_id: rec.fields.associated_event.into_iter().next(),
            amount: rec.fields.amount,
            status: rec.fields.status,
            disbursement_type: rec.fields.disbursement_type,
            notes: rec.fields.notes,
        }
    }
}
