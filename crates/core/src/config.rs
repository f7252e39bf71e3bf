//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into services. The intent is to avoid reading process-wide environment variables
//! while a reconciliation run is in progress, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.
//!
//! The `*_from_env_value` helpers take the raw `Option<String>` of an environment variable so that
//! binaries do the reading and tests never touch the process environment.

use crate::constants::DEFAULT_API_BASE_URL;
use crate::validation::validate_api_base_url;
use crate::{PercapitaError, PercapitaResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_base_url: String,
    api_token: Option<String>,
    use_batch_endpoint: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A trailing `/` on the base URL is removed and a blank token is treated as absent.
    pub fn new(
        api_base_url: String,
        api_token: Option<String>,
        use_batch_endpoint: bool,
    ) -> PercapitaResult<Self> {
        validate_api_base_url(&api_base_url)?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token: api_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            use_batch_endpoint,
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn use_batch_endpoint(&self) -> bool {
        self.use_batch_endpoint
    }
}

/// Resolve the backend base URL from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_API_BASE_URL`].
pub fn api_base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `1/true/yes/on` and `0/false/no/off` (case-insensitive). Unset or blank yields
/// `default`.
pub fn bool_from_env_value(
    name: &str,
    value: Option<String>,
    default: bool,
) -> PercapitaResult<bool> {
    let Some(value) = value.map(|v| v.trim().to_ascii_lowercase()).filter(|v| !v.is_empty())
    else {
        return Ok(default);
    };

    match value.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PercapitaError::InvalidInput(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}

/// Parse the runner interval (whole seconds) from an optional string value.
///
/// Unset or blank means "run once" and yields `None`. Zero is rejected.
pub fn run_interval_from_env_value(value: Option<String>) -> PercapitaResult<Option<Duration>> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let secs: u64 = value.parse().map_err(|_| {
        PercapitaError::InvalidInput(format!("run interval must be whole seconds, got '{value}'"))
    })?;
    if secs == 0 {
        return Err(PercapitaError::InvalidInput(
            "run interval must be greater than zero".into(),
        ));
    }
    Ok(Some(Duration::from_secs(secs)))
}
