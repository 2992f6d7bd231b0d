pub mod http;

use async_trait::async_trait;

use crate::configuration::SessionSettings;
use crate::domain::models::PreviewSyncError;
use crate::domain::models::PreviewTransport;
use crate::domain::models::PreviewTransportBox;

/// Used when no preview renderer is configured.
pub struct DisabledPreviewTransport {}

#[async_trait]
impl PreviewTransport for DisabledPreviewTransport {
    async fn sync(&self, code: &str) -> Result<(), PreviewSyncError> {
        tracing::trace!(bytes = code.len(), "preview renderer disabled, dropping push");
        Ok(())
    }
}

pub struct PreviewTransportManager {}

impl PreviewTransportManager {
    pub fn get(settings: &SessionSettings) -> PreviewTransportBox {
        if settings.preview_url.is_empty() {
            return Box::new(DisabledPreviewTransport {});
        }

        Box::new(http::HttpPreviewTransport::new(
            &settings.preview_url,
            settings.request_timeout,
        ))
    }
}
