//! Disbursement Planning
//!
//! The filter/classification step shared by the pipeline and the preview.
//! Both must select the same events with the same amounts and directions, so
//! neither re-implements it.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::money;
use crate::records::{DisbursementType, Event};

/// How a run selects events and amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Sign of `amount_owed` decides; amounts that round to zero cents are skipped
    Standard,
    /// Every event receives this fixed amount as a grant
    Custom(Decimal),
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Standard => "standard",
            RunMode::Custom(_) => "custom",
        }
    }
}

/// Which way money moves relative to the operating organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Operating org -> event org
    Grant,
    /// Event org -> operating org
    Withdrawal,
}

/// One event selected for disbursement
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDisbursement {
    pub event: Event,
    /// Amount recorded on the disbursement (signed for withdrawals)
    pub amount: Decimal,
    pub direction: Direction,
    pub disbursement_type: DisbursementType,
}

impl PlannedDisbursement {
    /// `(source, destination)` organizations for the transfer
    pub fn route<'a>(&'a self, operating_org: &'a str) -> (&'a str, &'a str) {
        match self.direction {
            Direction::Grant => (operating_org, self.event.organization_id.as_str()),
            Direction::Withdrawal => (self.event.organization_id.as_str(), operating_org),
        }
    }
}

/// Select and classify events for a run, preserving fetch order
pub fn plan(events: Vec<Event>, mode: RunMode) -> Vec<PlannedDisbursement> {
    match mode {
        RunMode::Standard => events
            .into_iter()
            .filter_map(|event| {
                let amount = event.amount_owed;
                // Too-large amounts stay planned and fail per event in the pipeline
                if matches!(money::to_cents(amount), Ok(0)) {
                    return None;
                }
                let (direction, disbursement_type) = if amount.is_sign_positive() {
                    (Direction::Grant, DisbursementType::Autogrant)
                } else {
                    (Direction::Withdrawal, DisbursementType::Withdrawal)
                };
                Some(PlannedDisbursement {
                    event,
                    amount,
                    direction,
                    disbursement_type,
                })
            })
            .collect(),
        RunMode::Custom(fixed) => events
            .into_iter()
            .map(|event| PlannedDisbursement {
                event,
                amount: fixed,
                direction: Direction::Grant,
                disbursement_type: DisbursementType::Miscellaneous,
            })
            .collect(),
    }
}

/// Signed sum of planned amounts, saturating at the `Decimal` range
pub fn total_amount(planned: &[PlannedDisbursement]) -> Decimal {
    planned
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.amount))
}
