use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use super::types::GenerateRequest;
use super::types::GenerateResponse;
use crate::domain::models::BackendName;
use crate::domain::models::GenerationClient;
use crate::domain::models::GenerationError;
use crate::domain::services::code_transformer;

/// Client for the remote generation service.
///
/// The service reports some failures inside an otherwise successful response,
/// as a `result` that starts with a known prefix. Those are surfaced as
/// `GenerationError::Backend`, separate from HTTP status and transport errors.
pub struct RemoteGenerationClient {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
    error_prefixes: Vec<String>,
}

impl RemoteGenerationClient {
    pub fn new(url: &str, timeout: Duration, error_prefixes: Vec<String>) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
            error_prefixes,
        }
    }

    fn is_error_result(&self, result: &str) -> bool {
        let head = result.trim_start();
        self.error_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && head.starts_with(prefix.as_str()))
    }

    fn interpret(&self, body: GenerateResponse) -> Result<String, GenerationError> {
        if let Some(result) = body.result {
            if self.is_error_result(&result) {
                return Err(GenerationError::Backend(result.trim().to_string()));
            }

            let code = code_transformer::strip_code_fences(&result);
            if code.trim().is_empty() {
                return Err(GenerationError::Backend(
                    "The generation service returned no code".to_string(),
                ));
            }
            return Ok(code);
        }

        if let Some(error) = body.error {
            return Err(GenerationError::Backend(error));
        }

        Err(GenerationError::Transport(
            "response contained neither a result nor an error".to_string(),
        ))
    }
}

#[async_trait]
impl GenerationClient for RemoteGenerationClient {
    fn name(&self) -> BackendName {
        BackendName::Remote
    }

    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Generation service URL is not defined");
        }

        let health_url = format!("{}/health", self.url);
        let res = self
            .client
            .get(&health_url)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match res {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = ?err, "generation service is not reachable");
                bail!("Generation service is not reachable");
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "generation service health check failed");
            bail!("Generation service health check failed");
        }

        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let generate_url = format!("{}/generate", self.url);
        tracing::info!(url = %generate_url, prompt_len = prompt.len(), "requesting generation");

        let response = self
            .client
            .post(&generate_url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&GenerateRequest { question: prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %text, "generation request rejected");

            return match serde_json::from_str::<GenerateResponse>(&text) {
                Ok(GenerateResponse {
                    error: Some(error), ..
                }) => Err(GenerationError::Backend(error)),
                _ => Err(GenerationError::Status(status.as_u16())),
            };
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| GenerationError::Transport(format!("invalid response body: {err}")))?;

        let result = self.interpret(body);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "generation service reported a failure");
        }

        result
    }
}
