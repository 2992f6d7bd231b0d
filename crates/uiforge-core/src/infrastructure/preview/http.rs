use std::time::Duration;

use async_trait::async_trait;

use crate::domain::models::PreviewSyncError;
use crate::domain::models::PreviewTransport;
use crate::infrastructure::clients::types::SyncPreviewRequest;

/// Pushes code to the preview renderer with `POST {url}/sync`. Any 2xx
/// response counts as an acknowledgement; the body is ignored.
pub struct HttpPreviewTransport {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPreviewTransport {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl PreviewTransport for HttpPreviewTransport {
    async fn sync(&self, code: &str) -> Result<(), PreviewSyncError> {
        let sync_url = format!("{}/sync", self.url);
        let response = self
            .client
            .post(&sync_url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&SyncPreviewRequest { code })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewSyncError::Status(status.as_u16()));
        }

        Ok(())
    }
}
