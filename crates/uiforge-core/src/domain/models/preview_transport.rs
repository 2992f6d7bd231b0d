use async_trait::async_trait;

use super::PreviewSyncError;

/// Delivers code to the external preview renderer.
#[async_trait]
pub trait PreviewTransport: Send + Sync {
    async fn sync(&self, code: &str) -> Result<(), PreviewSyncError>;
}

pub type PreviewTransportBox = Box<dyn PreviewTransport>;
