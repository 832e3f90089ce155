//! Preview Service
//!
//! Read-only projection of a run: fetches events and applies the same
//! planning step as the pipeline, with no writes and no transfers.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::Result;
use crate::money;
use crate::pipeline::{Direction, PlannedDisbursement, RunMode, plan, total_amount};
use crate::records::RecordsStore;

/// One event as it would be disbursed
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PreviewEvent {
    /// Store record id of the event
    #[schema(example = "recA1b2C3d4E5f6G7")]
    pub record_id: String,
    /// The event's own `record_id` column, empty when unset
    #[schema(example = "BOS-1")]
    pub event_record_id: String,
    /// Organization on the other side of the transfer
    #[schema(example = "daydream-boston")]
    pub counterparty_id: String,
    /// Signed dollar amount recorded on the disbursement
    #[serde(serialize_with = "money::serialize_dollars")]
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    pub direction: Direction,
}

impl From<&PlannedDisbursement> for PreviewEvent {
    fn from(p: &PlannedDisbursement) -> Self {
        Self {
            record_id: p.event.id.clone(),
            event_record_id: p.event.record_id.clone(),
            counterparty_id: p.event.organization_id.clone(),
            amount: p.amount,
            direction: p.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Preview {
    pub events: Vec<PreviewEvent>,
    /// Events fetched from the view, selected or not
    pub total_events: usize,
    #[serde(serialize_with = "money::serialize_dollars")]
    #[schema(value_type = String, example = "2.00")]
    pub total_amount: Decimal,
    /// Events that would get a disbursement
    pub event_count: usize,
}

pub struct PreviewService {
    records: Arc<dyn RecordsStore>,
    events_view: String,
}

impl PreviewService {
    pub fn new(records: Arc<dyn RecordsStore>, events_view: impl Into<String>) -> Self {
        Self {
            records,
            events_view: events_view.into(),
        }
    }

    /// Standard preview when `custom_amount` is `None`, otherwise the custom one
    pub async fn preview(&self, custom_amount: Option<Decimal>) -> Result<Preview> {
        let mode = match custom_amount {
            Some(amount) => {
                money::validate_custom_amount(amount)?;
                RunMode::Custom(amount)
            }
            None => RunMode::Standard,
        };

        let events = self.records.list_events(&self.events_view).await?;
        let total_events = events.len();
        let planned = plan(events, mode);

        let preview = Preview {
            events: planned.iter().map(PreviewEvent::from).collect(),
            total_events,
            total_amount: total_amount(&planned),
            event_count: planned.len(),
        };
        info!(
            mode = mode.label(),
            "Preview: {} of {} events, total ${}",
            preview.event_count,
            preview.total_events,
            money::format_dollars(preview.total_amount)
        );
        Ok(preview)
    }
}
