//! HCB Transfer Client
//!
//! Wraps `POST {api_base}/organizations/{org}/transfers/` with bearer auth.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{TransferApi, TransferRequest};
use crate::config::TransferConfig;
use crate::error::{DisbursementError, Result, Upstream};

pub struct HcbClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl HcbClient {
    pub fn new(config: &TransferConfig) -> Result<Self> {
        info!("Initializing HCB client at {}", config.api_base);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DisbursementError::transport(Upstream::Hcb, e))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl TransferApi for HcbClient {
    async fn transfer(
        &self,
        source_org: &str,
        dest_org: &str,
        name: &str,
        amount_cents: u64,
    ) -> Result<()> {
        let url = format!("{}/organizations/{}/transfers/", self.api_base, source_org);
        let request = TransferRequest {
            to_organization_id: dest_org.to_string(),
            name: name.to_string(),
            amount_cents,
        };
        debug!(
            source = source_org,
            dest = dest_org,
            amount_cents, "Sending HCB transfer"
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| DisbursementError::transport(Upstream::Hcb, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DisbursementError::upstream(
                Upstream::Hcb,
                Some(status.as_u16()),
                body,
            ));
        }

        info!("HCB transfer successful: {}", body);
        Ok(())
    }
}
