//! HTTP client for the spreadsheet web app that keeps the submission log.

use std::time::Duration;

use async_trait::async_trait;
use essaymark_core::SubmissionRecord;
use tracing::info;

use crate::{RecordSink, SyncError};

/// Posts each record as a JSON body to a Google Apps Script web-app URL.
pub struct SheetClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SheetClient {
    /// `timeout` bounds the whole request, response body included.
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// The web app answers 200 even when its script fails, so an explicit
/// `{"result": "error"}` body is treated as a rejection. Anything else counts
/// as accepted.
fn rejection(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let outcome = value
        .get("result")
        .or_else(|| value.get("status"))?
        .as_str()?;
    if !outcome.eq_ignore_ascii_case("error") {
        return None;
    }
    let message = value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("unspecified error");
    Some(message.to_string())
}

#[async_trait]
impl RecordSink for SheetClient {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), SyncError> {
        info!(url = %self.url, round = record.round.as_str(), group = %record.group, "posting submission record");
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        if let Some(message) = rejection(&body) {
            return Err(SyncError::Rejected(message));
        }
        info!(round = record.round.as_str(), "record logged");
        Ok(())
    }
}
