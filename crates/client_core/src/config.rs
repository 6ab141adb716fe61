use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use url::Url;

use crate::error::TransferError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const SETTINGS_FILE: &str = "rag_client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub api_base: String,
    /// Drop only `application/pdf` entries when files are dragged onto the window.
    pub strict_drop_filter: bool,
    pub command_queue_depth: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            strict_drop_filter: true,
            command_queue_depth: 64,
        }
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then `path` (flat string keys), then environment. Unusable values are skipped.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_base") {
                    settings.api_base = v.clone();
                }
                if let Some(v) = file_cfg.get("strict_drop_filter").and_then(|v| parse_flag(v)) {
                    settings.strict_drop_filter = v;
                }
                if let Some(v) = file_cfg
                    .get("command_queue_depth")
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .filter(|depth| *depth > 0)
                {
                    settings.command_queue_depth = v;
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable settings file: {err}");
            }
        }
    }

    let non_empty = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    if let Some(v) = non_empty("RAG_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = non_empty("APP__API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = non_empty("APP__STRICT_DROP_FILTER").and_then(|v| parse_flag(&v)) {
        settings.strict_drop_filter = v;
    }

    settings
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validates an http(s) base endpoint and strips trailing slashes. Blank input means the default.
pub fn normalize_api_base(raw: &str) -> Result<String, TransferError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_API_BASE.to_string());
    }

    let invalid = |reason: String| TransferError::InvalidBaseUrl {
        value: trimmed.to_string(),
        reason,
    };
    let parsed = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
