//! Run Statistics
//!
//! Counters for the most recent triggered run. The pipeline resets and fills
//! them; the dashboard reads snapshots. Process memory only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Statistics for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct RunStats {
    /// Events fetched from the view
    pub total_events: usize,
    /// Events selected for disbursement
    pub events_with_amount: usize,
    /// Signed sum of the selected amounts, in dollars
    #[serde(serialize_with = "crate::money::serialize_dollars")]
    #[schema(value_type = String, example = "125.00")]
    pub total_amount_owed: Decimal,
    pub disbursements_created: usize,
    pub processed: usize,
    pub failed: usize,
    pub last_run: Option<DateTime<Utc>>,
}

/// Lock-guarded holder shared between the pipeline and the dashboard
#[derive(Debug, Default)]
pub struct StatsHolder {
    inner: RwLock<RunStats>,
}

impl StatsHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter and stamp `last_run`
    pub async fn reset(&self, now: DateTime<Utc>) {
        let mut stats = self.inner.write().await;
        *stats = RunStats {
            last_run: Some(now),
            ..RunStats::default()
        };
    }

    /// Apply a mutation under the write lock
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut RunStats),
    {
        let mut stats = self.inner.write().await;
        f(&mut stats);
    }

    pub async fn snapshot(&self) -> RunStats {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_clears_counters_and_stamps_time() {
        let holder = StatsHolder::new();
        holder
            .update(|s| {
                s.total_events = 4;
                s.disbursements_created = 3;
                s.failed = 1;
            })
            .await;

        let now = Utc::now();
        holder.reset(now).await;

        let snap = holder.snapshot().await;
        assert_eq!(snap.total_events, 0);
        assert_eq!(snap.disbursements_created, 0);
        assert_eq!(snap.failed, 0);
        assert_eq!(snap.last_run, Some(now));
    }

    #[tokio::test]
    async fn test_fresh_holder_never_ran() {
        let holder = StatsHolder::new();
        assert_eq!(holder.snapshot().await, RunStats::default());
        assert!(holder.snapshot().await.last_run.is_none());
    }
}
