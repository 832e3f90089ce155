use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::{DisbursementPipeline, PipelineSettings};
use crate::preview::PreviewService;
use crate::records::{AirtableClient, RecordsStore};
use crate::stats::StatsHolder;
use crate::transfer::{HcbClient, TransferApi};

/// The single shared username/password pair gating the dashboard
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Dashboard application state (shared)
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DisbursementPipeline>,
    pub preview: Arc<PreviewService>,
    pub stats: Arc<StatsHolder>,
    pub credentials: BasicCredentials,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordsStore>,
        transfers: Arc<dyn TransferApi>,
        settings: PipelineSettings,
        credentials: BasicCredentials,
    ) -> Self {
        let stats = Arc::new(StatsHolder::new());
        let preview = Arc::new(PreviewService::new(
            records.clone(),
            settings.events_view.clone(),
        ));
        let pipeline = Arc::new(DisbursementPipeline::new(
            records,
            transfers,
            stats.clone(),
            settings,
        ));
        Self {
            pipeline,
            preview,
            stats,
            credentials,
        }
    }

    /// Wire the Airtable and HCB clients from config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let records: Arc<dyn RecordsStore> = Arc::new(AirtableClient::new(&config.records)?);
        let transfers: Arc<dyn TransferApi> = Arc::new(HcbClient::new(&config.transfer)?);
        Ok(Self::new(
            records,
            transfers,
            PipelineSettings::from_config(config),
            BasicCredentials {
                username: config.auth.username.clone(),
                password: config.auth.password.clone(),
            },
        ))
    }
}
