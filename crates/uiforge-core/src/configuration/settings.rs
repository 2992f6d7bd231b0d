use std::time::Duration;

use anyhow::Context;
use anyhow::Result;

use super::Config;
use super::ConfigKey;

/// Typed settings the session engine is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub generate_url: String,
    pub preview_url: String,
    pub admin_mode: bool,
    pub preview_debounce: Duration,
    pub stub_latency: Duration,
    pub request_timeout: Duration,
    /// Result prefixes the generation service uses to report failures.
    pub error_prefixes: Vec<String>,
    pub max_attachment_bytes: u64,
}

impl Default for SessionSettings {
    fn default() -> SessionSettings {
        return SessionSettings::from_lookup(Config::default)
            .expect("built-in defaults are valid");
    }
}

fn parse_bool(key: ConfigKey, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("invalid boolean for '{key}': {other}"),
    }
}

fn parse_u64(key: ConfigKey, raw: &str) -> Result<u64> {
    return raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("invalid number for '{key}': {raw}"));
}

fn parse_millis(key: ConfigKey, raw: &str) -> Result<Duration> {
    return Ok(Duration::from_millis(parse_u64(key, raw)?));
}

impl SessionSettings {
    pub fn from_config() -> Result<SessionSettings> {
        return SessionSettings::from_lookup(Config::get);
    }

    pub fn from_lookup(lookup: impl Fn(ConfigKey) -> String) -> Result<SessionSettings> {
        let error_prefixes = lookup(ConfigKey::ErrorPrefix)
            .split('|')
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string)
            .collect();

        return Ok(SessionSettings {
            generate_url: lookup(ConfigKey::GenerateUrl).trim().to_string(),
            preview_url: lookup(ConfigKey::PreviewUrl).trim().to_string(),
            admin_mode: parse_bool(ConfigKey::AdminMode, &lookup(ConfigKey::AdminMode))?,
            preview_debounce: parse_millis(
                ConfigKey::PreviewDebounceMs,
                &lookup(ConfigKey::PreviewDebounceMs),
            )?,
            stub_latency: parse_millis(ConfigKey::StubLatencyMs, &lookup(ConfigKey::StubLatencyMs))?,
            request_timeout: parse_millis(
                ConfigKey::RequestTimeoutMs,
                &lookup(ConfigKey::RequestTimeoutMs),
            )?,
            error_prefixes,
            max_attachment_bytes: parse_u64(
                ConfigKey::MaxAttachmentBytes,
                &lookup(ConfigKey::MaxAttachmentBytes),
            )?,
        });
    }
}
