//! System log fetching

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{OktaClient, OktaError};
use crate::worker::{LogSource, SourceError};

/// One page per scan; the checkpoint advances each batch, so subsequent
/// scans pick up where this one left off.
const PAGE_LIMIT: u32 = 200;

impl OktaClient {
    /// Fetch system log events published since a checkpoint. With no
    /// checkpoint the provider returns its default recent window.
    pub async fn fetch_system_logs(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Value>, OktaError> {
        let endpoint = self.endpoint("/logs");
        let mut request = self
            .http()
            .get(&endpoint)
            .query(&[("limit", PAGE_LIMIT.to_string())]);
        if let Some(since) = since {
            request = request.query(&[("since", since.to_rfc3339())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(OktaError::Api {
                status: response.status(),
                endpoint,
            });
        }

        let logs: Vec<Value> = response.json().await?;
        log::info!("Fetched {} log entries from Okta", logs.len());
        Ok(logs)
    }
}

#[async_trait]
impl LogSource for OktaClient {
    async fn fetch_logs(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Value>, SourceError> {
        self.fetch_system_logs(since)
            .await
            .map_err(|e| SourceError::Fetch(e.to_string()))
    }
}
