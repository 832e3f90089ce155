//! Airtable Records Client
//!
//! Bearer-token REST client for the events and disbursements tables.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::RecordsStore;
use super::types::{
    Disbursement, DisbursementRecord, DisbursementStatus, Event, EventsPage, FieldsBody,
    NewDisbursement, StatusUpdate,
};
use crate::config::RecordsConfig;
use crate::error::{DisbursementError, Result, Upstream};

/// Records client backed by the Airtable REST API
pub struct AirtableClient {
    http: reqwest::Client,
    /// `{api_base}/{base_id}`
    base_url: String,
    api_key: String,
    events_table: String,
    disbursements_table: String,
}

impl AirtableClient {
    /// Create a new client from config
    pub fn new(config: &RecordsConfig) -> Result<Self> {
        info!(
            "Initializing Airtable client for base {} (events table '{}', disbursements table '{}')",
            config.base_id, config.events_table, config.disbursements_table
        );

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DisbursementError::transport(Upstream::Airtable, e))?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.base_id
            ),
            api_key: config.api_key.clone(),
            events_table: config.events_table.clone(),
            disbursements_table: config.disbursements_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// Fetch one page of a view, returning its records and the next cursor
    async fn events_page(
        &self,
        view: &str,
        offset: Option<&str>,
    ) -> Result<(Vec<Event>, Option<String>)> {
        let mut request = self
            .http
            .get(self.table_url(&self.events_table))
            .bearer_auth(&self.api_key)
            .query(&[("view", view)]);
        if let Some(cursor) = offset {
            request = request.query(&[("offset", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DisbursementError::transport(Upstream::Airtable, e))?;
        let page: EventsPage = read_json(response).await?;

        let events = page.records.into_iter().map(Event::from).collect();
        Ok((events, page.offset))
    }
}

#[async_trait]
impl RecordsStore for AirtableClient {
    async fn list_events(&self, view: &str) -> Result<Vec<Event>> {
        let mut all = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let (events, next) = self.events_page(view, offset.as_deref()).await?;
            pages += 1;
            debug!(page = pages, records = events.len(), "Fetched events page");
            all.extend(events);

            match next {
                Some(cursor) if !cursor.is_empty() => offset = Some(cursor),
                _ => break,
            }
        }

        info!("Fetched {} events across {} page(s)", all.len(), pages);
        Ok(all)
    }

    async fn create_disbursement(&self, new: &NewDisbursement) -> Result<Disbursement> {
        let response = self
            .http
            .post(self.table_url(&self.disbursements_table))
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields: new })
            .send()
            .await
            .map_err(|e| DisbursementError::transport(Upstream::Airtable, e))?;

        let record: DisbursementRecord = read_json(response).await?;
        Ok(record.into())
    }

    async fn update_disbursement_status(
        &self,
        id: &str,
        status: DisbursementStatus,
        notes: &str,
    ) -> Result<()> {
        let url = format!("{}/{}", self.table_url(&self.disbursements_table), id);
        let response = self
            .http
            .patch(url)
            .bearer_auth(&self.api_key)
            .json(&FieldsBody {
                fields: StatusUpdate { status, notes },
            })
            .send()
            .await
            .map_err(|e| DisbursementError::transport(Upstream::Airtable, e))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DisbursementError::upstream(
                Upstream::Airtable,
                Some(status_code.as_u16()),
                body,
            ));
        }
        Ok(())
    }
}

/// Read a response body, failing on non-2xx status or unparseable JSON
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DisbursementError::transport(Upstream::Airtable, e))?;

    if !status.is_success() {
        return Err(DisbursementError::upstream(
            Upstream::Airtable,
            Some(status.as_u16()),
            body,
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        DisbursementError::upstream(
            Upstream::Airtable,
            None,
            format!("malformed response ({}): {}", e, body),
        )
    })
}
