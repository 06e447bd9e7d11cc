//! Batch upload to the backend service
//!
//! Accepted records are forwarded to an external backend in bounded
//! batches. Each batch succeeds or fails as a unit; a failed batch leaves
//! its rows pending in the local store for a later attempt.

use crate::config::BackendConfig;
use crate::record::ClassRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of records per upload batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Aggregate result of an upload attempt
///
/// `uploaded` and `failed` are record counts summed across batches;
/// `errors` holds one message per failed batch.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl UploadReport {
    /// True when no batch failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Serialize)]
struct UploadBody<'a> {
    classes: &'a [ClassRecord],
}

#[derive(Deserialize)]
struct UploadResponse {
    uploaded: Option<u32>,
}

/// Client for the backend upload endpoint
pub struct BackendClient {
    client: Client,
    upload_url: String,
    api_key: Option<String>,
    batch_size: usize,
    batch_delay: Duration,
}

impl BackendClient {
    /// Creates a client from the backend configuration section
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.batch_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        })
    }

    /// Pushes records to the backend in fixed-size batches
    ///
    /// Batches are sent sequentially. On HTTP success the server-reported
    /// uploaded count is credited, falling back to the batch size when the
    /// response omits it — failures hidden inside a 2xx response are
    /// invisible unless the server reports a smaller count. On any failure
    /// (timeout, non-2xx, network error) the whole batch counts as failed
    /// and processing continues with the next batch. A fixed delay
    /// separates batches; there is no adaptive backoff.
    pub async fn upload(&self, records: &[ClassRecord]) -> UploadReport {
        let mut report = UploadReport::default();
        if records.is_empty() {
            return report;
        }

        let batch_count = records.chunks(self.batch_size).count();
        tracing::info!(
            "Uploading {} records in {} batches of up to {}",
            records.len(),
            batch_count,
            self.batch_size
        );

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            match self.send_batch(batch).await {
                Ok(count) => {
                    tracing::debug!("Batch {}: {} uploaded", index + 1, count);
                    report.uploaded += count;
                }
                Err(message) => {
                    tracing::warn!("Batch {} failed: {}", index + 1, message);
                    report.failed += batch.len() as u32;
                    report.errors.push(message);
                }
            }

            if index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        report
    }

    /// Sends one batch; returns the credited upload count or an error message
    async fn send_batch(&self, batch: &[ClassRecord]) -> Result<u32, String> {
        let mut request = self
            .client
            .post(&self.upload_url)
            .json(&UploadBody { classes: batch });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("backend returned HTTP {status}"));
        }

        // A 2xx with no parseable body still counts as a full-batch success
        let reported = response
            .json::<UploadResponse>()
            .await
            .ok()
            .and_then(|body| body.uploaded);

        Ok(reported.unwrap_or(batch.len() as u32))
    }
}
