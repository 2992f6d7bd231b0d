use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::EnumVariantNames;

use super::GenerationError;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumVariantNames,
    Serialize,
    Deserialize,
    EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum BackendName {
    #[default]
    Remote,
    Stub,
}

impl BackendName {
    pub fn for_admin_mode(is_admin_mode: bool) -> BackendName {
        if is_admin_mode {
            return BackendName::Stub;
        }
        BackendName::Remote
    }
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    fn name(&self) -> BackendName;
    async fn health_check(&self) -> Result<()>;
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub type GenerationClientBox = Box<dyn GenerationClient>;
