pub mod remote;
pub mod stub;
pub mod types;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::SessionSettings;
use crate::domain::models::BackendName;
use crate::domain::models::GenerationClientBox;

pub struct GenerationClientManager {}

impl GenerationClientManager {
    pub fn get(name: BackendName, settings: &SessionSettings) -> Result<GenerationClientBox> {
        match name {
            BackendName::Remote => {
                if settings.generate_url.is_empty() {
                    bail!("generate-url is not configured, set it or enable admin mode");
                }
                Ok(Box::new(remote::RemoteGenerationClient::new(
                    &settings.generate_url,
                    settings.request_timeout,
                    settings.error_prefixes.clone(),
                )))
            }
            BackendName::Stub => Ok(Box::new(stub::StubGenerationClient::new(
                settings.stub_latency,
            ))),
        }
    }
}
