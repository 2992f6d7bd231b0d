use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time;

use crate::domain::models::BackendName;
use crate::domain::models::GenerationClient;
use crate::domain::models::GenerationError;

pub const PLACEHOLDER_CODE: &str = r#"import React from 'react';
import { Box, Button, Input, Typography } from '@nlmk/ds-2.0';

export default function App() {
  return (
    <Box style={{ display: 'flex', flexDirection: 'column', gap: 16, padding: 24 }}>
      <Typography variant="h3">Placeholder interface</Typography>
      <Input label="Name" />
      <Button>Submit</Button>
    </Box>
  );
}
"#;

/// Local backend for admin mode: waits a fixed latency and always returns
/// the same placeholder, whatever the prompt.
pub struct StubGenerationClient {
    latency: Duration,
}

impl StubGenerationClient {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl GenerationClient for StubGenerationClient {
    fn name(&self) -> BackendName {
        BackendName::Stub
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(prompt_len = prompt.len(), latency_ms = self.latency.as_millis() as u64, "stub generation");
        time::sleep(self.latency).await;
        Ok(PLACEHOLDER_CODE.to_string())
    }
}
