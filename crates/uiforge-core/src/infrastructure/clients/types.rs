use serde::Deserialize;
use serde::Serialize;

/// Body of `POST /generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub question: &'a str,
}

/// Both fields are optional on the wire: success carries `result`, a rejected
/// request carries `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /sync` on the preview renderer.
#[derive(Debug, Clone, Serialize)]
pub struct SyncPreviewRequest<'a> {
    pub code: &'a str,
}
