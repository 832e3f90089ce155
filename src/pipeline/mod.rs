//! Disbursement Pipeline
//!
//! Fetch → plan → (create → transfer → update) per event.
//!
//! ```text
//!  list_events ──▶ plan ──▶ for each planned event, in fetch order:
//!                             create_disbursement (pending)
//!                             transfer (abs cents, direction by org)
//!                             update status (processed | failed)
//! ```
//!
//! # Invariants
//!
//! 1. `processed + failed == created` when a run returns
//! 2. A per-event failure never aborts the run; a failed event fetch always does
//! 3. At most one run at a time; a second trigger gets `RunInProgress`

pub mod plan;

pub use plan::{Direction, PlannedDisbursement, RunMode, plan, total_amount};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};
use ulid::Ulid;
use utoipa::ToSchema;

use crate::config::{AppConfig, NamingConfig};
use crate::error::{DisbursementError, Result};
use crate::money;
use crate::records::{
    Disbursement, DisbursementStatus, DisbursementType, NewDisbursement, RecordsStore,
};
use crate::stats::StatsHolder;
use crate::transfer::TransferApi;

/// Aggregate outcome of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RunResult {
    #[schema(example = 3)]
    pub created: usize,
    #[schema(example = 2)]
    pub processed: usize,
    #[schema(example = 1)]
    pub failed: usize,
}

impl RunResult {
    fn record(&mut self, outcome: EventOutcome) {
        self.created += 1;
        match outcome {
            EventOutcome::Processed => self.processed += 1,
            EventOutcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventOutcome {
    Processed,
    Failed,
}

/// Settings the pipeline needs from config
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub events_view: String,
    pub operating_org: String,
    pub naming: NamingConfig,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            events_view: config.records.events_view.clone(),
            operating_org: config.transfer.operating_org.clone(),
            naming: config.naming.clone(),
        }
    }
}

/// Clears the run-in-progress flag on drop, including on early return
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DisbursementError::RunInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct DisbursementPipeline {
    records: Arc<dyn RecordsStore>,
    transfers: Arc<dyn TransferApi>,
    stats: Arc<StatsHolder>,
    settings: PipelineSettings,
    running: AtomicBool,
}

impl DisbursementPipeline {
    pub fn new(
        records: Arc<dyn RecordsStore>,
        transfers: Arc<dyn TransferApi>,
        stats: Arc<StatsHolder>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            records,
            transfers,
            stats,
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Grant positive owed amounts, withdraw negative ones, skip zero
    pub async fn run_standard(&self) -> Result<RunResult> {
        self.run(RunMode::Standard).await
    }

    /// Grant `fixed_amount` to every event in the view
    ///
    /// The amount is validated before any upstream call.
    pub async fn run_custom(&self, fixed_amount: Decimal) -> Result<RunResult> {
        money::validate_custom_amount(fixed_amount)?;
        self.run(RunMode::Custom(fixed_amount)).await
    }

    async fn run(&self, mode: RunMode) -> Result<RunResult> {
        let _guard = RunGuard::acquire(&self.running)?;
        let run_id = Ulid::new();
        let span = info_span!("disbursement_run", %run_id, mode = mode.label());

        async move {
            info!("Starting disbursement process...");
            self.stats.reset(Utc::now()).await;

            let events = self
                .records
                .list_events(&self.settings.events_view)
                .await
                .inspect_err(|e| error!("Error fetching events: {}", e))?;
            let total_events = events.len();
            info!("Found {} total events", total_events);

            let planned = plan(events, mode);
            let total = total_amount(&planned);
            let selected = planned.len();
            self.stats
                .update(|s| {
                    s.total_events = total_events;
                    s.events_with_amount = selected;
                    s.total_amount_owed = total;
                })
                .await;
            info!(
                "Selected {} events for disbursement, total amount: ${}",
                selected,
                money::format_dollars(total)
            );

            let mut result = RunResult::default();
            for item in &planned {
                let outcome = self.process_event(item).await;
                result.record(outcome);
                self.stats
                    .update(|s| {
                        s.disbursements_created += 1;
                        match outcome {
                            EventOutcome::Processed => s.processed += 1,
                            EventOutcome::Failed => s.failed += 1,
                        }
                    })
                    .await;
            }

            info!(
                "Disbursement process completed. Created: {}, Processed: {}, Failed: {}",
                result.created, result.processed, result.failed
            );
            Ok::<_, DisbursementError>(result)
        }
        .instrument(span)
        .await
    }

    /// Create, transfer and finalize one disbursement. Never fails the run.
    async fn process_event(&self, item: &PlannedDisbursement) -> EventOutcome {
        let event = &item.event;
        info!(
            event_record = %event.record_id,
            "Processing disbursement for event {} (HCB ID: {}, Amount: ${})",
            event.id,
            event.organization_id,
            money::format_dollars(item.amount)
        );

        let new = NewDisbursement::pending(
            &event.id,
            item.amount,
            item.disbursement_type,
            format!("Created for event {} at {}", event.id, timestamp(Utc::now())),
        );
        let disbursement = match self.records.create_disbursement(&new).await {
            Ok(d) => d,
            Err(e) => {
                error!(
                    "Failed to create disbursement for event {}: {}",
                    event.id, e
                );
                return EventOutcome::Failed;
            }
        };
        info!(
            "Created disbursement {} for event {}",
            disbursement.disbursement_id, event.id
        );

        let (source, dest) = item.route(&self.settings.operating_org);
        let name = format!(
            "{} {}",
            self.transfer_label(item),
            disbursement.disbursement_id
        );
        let transferred = match money::to_cents(item.amount) {
            Ok(cents) => self.transfers.transfer(source, dest, &name, cents).await,
            Err(e) => Err(e),
        };

        match transferred {
            Ok(()) => {
                let notes = success_note(item, Utc::now());
                self.finalize(&disbursement, DisbursementStatus::Processed, &notes)
                    .await;
                info!(
                    "Successfully completed disbursement {}",
                    disbursement.disbursement_id
                );
                EventOutcome::Processed
            }
            Err(e) => {
                error!(
                    "HCB transfer failed for disbursement {} (event {}): {}",
                    disbursement.disbursement_id, event.id, e
                );
                let notes = format!(
                    "HCB transfer failed: {}. Failed at {}",
                    e,
                    timestamp(Utc::now())
                );
                self.finalize(&disbursement, DisbursementStatus::Failed, &notes)
                    .await;
                EventOutcome::Failed
            }
        }
    }

    /// Terminal status write; a failure here is logged and does not change the outcome
    async fn finalize(&self, disbursement: &Disbursement, status: DisbursementStatus, notes: &str) {
        if let Err(e) = self
            .records
            .update_disbursement_status(&disbursement.id, status, notes)
            .await
        {
            warn!(
                "Failed to update disbursement {} to {}: {}",
                disbursement.disbursement_id, status, e
            );
        }
    }

    fn transfer_label(&self, item: &PlannedDisbursement) -> &str {
        let naming = &self.settings.naming;
        match item.disbursement_type {
            DisbursementType::Autogrant => naming.grant_label.as_str(),
            DisbursementType::Withdrawal => naming.withdrawal_label.as_str(),
            DisbursementType::Miscellaneous => naming.custom_label.as_str(),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

fn success_note(item: &PlannedDisbursement, at: DateTime<Utc>) -> String {
    let amount = money::format_dollars(item.amount.abs());
    let org = &item.event.organization_id;
    let moved = match item.direction {
        Direction::Grant => format!("Sent ${} to organization {}", amount, org),
        Direction::Withdrawal => format!("Withdrew ${} from organization {}", amount, org),
    };
    format!(
        "Successfully processed HCB transfer. {}. Completed at {}",
        moved,
        timestamp(at)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Event, MockRecords};
    use crate::transfer::MockTransfers;
    use std::str::FromStr;

    fn event(id: &str, org: &str, owed: &str) -> Event {
        Event {
            id: id.to_string(),
            organization_id: org.to_string(),
            amount_owed: Decimal::from_str(owed).unwrap(),
            record_id: format!("R-{}", id),
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            events_view: "viwTEST".to_string(),
            operating_org: "daydream".to_string(),
            naming: NamingConfig::default(),
        }
    }

    struct TestHarness {
        pipeline: DisbursementPipeline,
        records: Arc<MockRecords>,
        transfers: Arc<MockTransfers>,
        stats: Arc<StatsHolder>,
    }

    impl TestHarness {
        fn new(events: Vec<Event>) -> Self {
            let records = Arc::new(MockRecords::new(events));
            let transfers = Arc::new(MockTransfers::new());
            let stats = Arc::new(StatsHolder::new());
            let pipeline = DisbursementPipeline::new(
                records.clone(),
                transfers.clone(),
                stats.clone(),
                settings(),
            );
            Self {
                pipeline,
                records,
                transfers,
                stats,
            }
        }
    }

    fn three_events() -> Vec<Event> {
        vec![
            event("recA", "org-a", "5.00"),
            event("recB", "org-b", "-3.00"),
            event("recC", "org-c", "0"),
        ]
    }

    #[tokio::test]
    async fn test_standard_run_skips_zero_and_tags_by_sign() {
        let h = TestHarness::new(three_events());

        let result = h.pipeline.run_standard().await.unwrap();
        assert_eq!(
            result,
            RunResult {
                created: 2,
                processed: 2,
                failed: 0
            }
        );

        let created = h.records.created();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].event_id.as_deref(), Some("recA"));
        assert_eq!(created[0].disbursement_type, DisbursementType::Autogrant);
        assert_eq!(created[0].status, DisbursementStatus::Pending);
        assert_eq!(created[1].event_id.as_deref(), Some("recB"));
        assert_eq!(created[1].disbursement_type, DisbursementType::Withdrawal);
        assert_eq!(created[1].amount, Decimal::from_str("-3.00").unwrap());
    }

    #[tokio::test]
    async fn test_standard_run_transfer_direction_and_cents() {
        let h = TestHarness::new(three_events());
        h.pipeline.run_standard().await.unwrap();

        let calls = h.transfers.calls();
        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].source_org, "daydream");
        assert_eq!(calls[0].dest_org, "org-a");
        assert_eq!(calls[0].amount_cents, 500);
        assert_eq!(calls[0].name, "Daydream signup grant 1");

        assert_eq!(calls[1].source_org, "org-b");
        assert_eq!(calls[1].dest_org, "daydream");
        assert_eq!(calls[1].amount_cents, 300);
        assert_eq!(calls[1].name, "Daydream withdrawal 2");
    }

    #[tokio::test]
    async fn test_success_notes_and_terminal_status() {
        let h = TestHarness::new(three_events());
        h.pipeline.run_standard().await.unwrap();

        let grant = h.records.disbursement("recD1").unwrap();
        assert_eq!(grant.status, DisbursementStatus::Processed);
        assert!(grant.notes.contains("Sent $5.00 to organization org-a"));
        assert!(grant.notes.contains("Completed at"));

        let withdrawal = h.records.disbursement("recD2").unwrap();
        assert_eq!(withdrawal.status, DisbursementStatus::Processed);
        assert!(
            withdrawal
                .notes
                .contains("Withdrew $3.00 from organization org-b")
        );
    }

    #[tokio::test]
    async fn test_transfer_failure_does_not_abort_run() {
        let h = TestHarness::new(vec![
            event("recA", "org-a", "5.00"),
            event("recB", "org-b", "7.50"),
            event("recC", "org-c", "-2.00"),
        ]);
        h.transfers.fail_for_org("org-b");

        let result = h.pipeline.run_standard().await.unwrap();
        assert_eq!(
            result,
            RunResult {
                created: 3,
                processed: 2,
                failed: 1
            }
        );

        let failed = h.records.disbursement("recD2").unwrap();
        assert_eq!(failed.status, DisbursementStatus::Failed);
        assert!(failed.notes.contains("HCB transfer failed"));
        assert!(failed.notes.contains("insufficient balance"));

        // Later events still processed
        assert_eq!(
            h.records.disbursement("recD3").unwrap().status,
            DisbursementStatus::Processed
        );
    }

    #[tokio::test]
    async fn test_oversized_amount_fails_event_and_run_continues() {
        let h = TestHarness::new(vec![
            event("recHuge", "org-huge", "1000000000000000000000000000"),
            event("recA", "org-a", "5.00"),
        ]);

        let result = h.pipeline.run_standard().await.unwrap();
        assert_eq!(
            result,
            RunResult {
                created: 2,
                processed: 1,
                failed: 1
            }
        );

        let huge = h.records.disbursement("recD1").unwrap();
        assert_eq!(huge.status, DisbursementStatus::Failed);
        assert!(huge.notes.contains("does not fit in cents"));

        // Only the normal event reached the transfer API
        let calls = h.transfers.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dest_org, "org-a");

        // Every created row was finalized exactly once, none left pending
        let updates = h.records.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].1, DisbursementStatus::Failed);
        assert_eq!(updates[1].1, DisbursementStatus::Processed);
        assert!(!h.pipeline.is_running());
    }

    #[tokio::test]
    async fn test_sub_cent_owed_amount_is_not_disbursed() {
        let h = TestHarness::new(vec![
            event("recDust", "org-dust", "0.004"),
            event("recA", "org-a", "5.00"),
        ]);

        let result = h.pipeline.run_standard().await.unwrap();
        assert_eq!(result.created, 1);
        assert!(h.transfers.calls().iter().all(|c| c.amount_cents > 0));
    }

    #[tokio::test]
    async fn test_create_failure_counts_as_failed_without_transfer() {
        let h = TestHarness::new(vec![
            event("recA", "org-a", "5.00"),
            event("recB", "org-b", "1.00"),
        ]);
        h.records.fail_create_for("recA");

        let result = h.pipeline.run_standard().await.unwrap();
        assert_eq!(result.created, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.processed, 1);

        let calls = h.transfers.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dest_org, "org-b");
    }

    #[tokio::test]
    async fn test_update_failure_keeps_processed_classification() {
        let h = TestHarness::new(vec![event("recA", "org-a", "5.00")]);
        h.records.set_fail_update(true);

        let result = h.pipeline.run_standard().await.unwrap();
        assert_eq!(result.processed, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(h.transfers.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_event_fetch_failure_is_fatal() {
        let h = TestHarness::new(three_events());
        h.records.set_fail_list(true);

        let err = h.pipeline.run_standard().await.unwrap_err();
        assert!(matches!(err, DisbursementError::Upstream { .. }));
        assert!(h.records.created().is_empty());
        assert!(h.transfers.calls().is_empty());
        // Guard released after the early return
        assert!(!h.pipeline.is_running());
    }

    #[tokio::test]
    async fn test_custom_run_includes_zero_owed_events() {
        let h = TestHarness::new(three_events());

        let fixed = Decimal::from_str("25").unwrap();
        let result = h.pipeline.run_custom(fixed).await.unwrap();
        assert_eq!(result.created, 3);
        assert_eq!(result.processed, 3);

        for d in h.records.created() {
            assert_eq!(d.disbursement_type, DisbursementType::Miscellaneous);
            assert_eq!(d.amount, fixed);
        }
        for call in h.transfers.calls() {
            assert_eq!(call.source_org, "daydream");
            assert_eq!(call.amount_cents, 2500);
            assert!(
                call.name
                    .starts_with("Daydream miscellaneous disbursement ")
            );
        }
    }

    #[tokio::test]
    async fn test_custom_run_rejects_non_positive_before_upstream() {
        let h = TestHarness::new(three_events());

        for bad in ["-1", "0", "0.001"] {
            let err = h
                .pipeline
                .run_custom(Decimal::from_str(bad).unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, DisbursementError::InvalidInput(_)));
        }
        assert_eq!(h.records.list_calls(), 0);
        assert!(h.transfers.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stats_reset_and_filled_per_run() {
        let h = TestHarness::new(three_events());
        h.transfers.fail_for_org("org-b");

        h.pipeline.run_standard().await.unwrap();
        let first = h.stats.snapshot().await;
        assert_eq!(first.total_events, 3);
        assert_eq!(first.events_with_amount, 2);
        assert_eq!(first.total_amount_owed, Decimal::from_str("2.00").unwrap());
        assert_eq!(first.disbursements_created, 2);
        assert_eq!(first.processed, 1);
        assert_eq!(first.failed, 1);
        assert!(first.last_run.is_some());

        // Second run starts from zero, no carry-over
        h.pipeline.run_standard().await.unwrap();
        let second = h.stats.snapshot().await;
        assert_eq!(second.disbursements_created, 2);
        assert_eq!(second.processed + second.failed, second.disbursements_created);
        assert!(second.last_run >= first.last_run);
    }

    #[tokio::test]
    async fn test_rerun_reprocesses_same_events() {
        let h = TestHarness::new(vec![event("recA", "org-a", "5.00")]);
        h.pipeline.run_standard().await.unwrap();
        h.pipeline.run_standard().await.unwrap();

        // No cross-run dedup
        assert_eq!(h.records.created().len(), 2);
        assert_eq!(h.transfers.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_run_rejected() {
        let h = TestHarness::new(three_events());

        let _held = RunGuard::acquire(&h.pipeline.running).unwrap();
        let err = h.pipeline.run_standard().await.unwrap_err();
        assert!(matches!(err, DisbursementError::RunInProgress));
        assert_eq!(h.records.list_calls(), 0);
    }

    #[test]
    fn test_run_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = RunGuard::acquire(&flag).unwrap();
            assert!(flag.load(Ordering::Acquire));
            assert!(RunGuard::acquire(&flag).is_err());
        }
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_timestamp_format() {
        let at = DateTime::parse_from_rfc3339("2025-07-04T13:05:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(at), "2025-07-04 13:05:09 UTC");
    }
}
