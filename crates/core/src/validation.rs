//! Input validation utilities.
//!
//! This module contains functions for validating configuration and catalog inputs before they are
//! used to build requests or populate dropdowns.

use crate::{PercapitaError, PercapitaResult};

/// Validates that a backend base URL is usable for building request URLs.
///
/// Request paths are appended directly to this value (`{base}/api/...`), so the guardrails are:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Requires an `http://` or `https://` scheme followed by a host
/// - Rejects non-ASCII characters and embedded whitespace
///
/// # Errors
///
/// Returns a `PercapitaError::InvalidInput` if the URL is invalid.
pub fn validate_api_base_url(url: &str) -> PercapitaResult<()> {
    const MAX_URL_LEN: usize = 2048;

    if url.trim().is_empty() {
        return Err(PercapitaError::InvalidInput(
            "API base URL cannot be empty".into(),
        ));
    }

    if url.len() > MAX_URL_LEN {
        return Err(PercapitaError::InvalidInput(format!(
            "API base URL exceeds maximum length of {} characters",
            MAX_URL_LEN
        )));
    }

    if !url.is_ascii() || url.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(PercapitaError::InvalidInput(
            "API base URL must be ASCII without whitespace".into(),
        ));
    }

    let host = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| {
            PercapitaError::InvalidInput("API base URL must start with http:// or https://".into())
        })?;

    if host.trim_end_matches('/').is_empty() {
        return Err(PercapitaError::InvalidInput(
            "API base URL is missing a host".into(),
        ));
    }

    Ok(())
}

/// Validates a catalog colour in `#RRGGBB` form.
pub fn validate_hex_color(color: &str) -> PercapitaResult<()> {
    let ok = color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit());

    if !ok {
        return Err(PercapitaError::InvalidInput(format!(
            "colour must be in #RRGGBB form, got '{color}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_base_url_accepts_valid_urls() {
        assert!(validate_api_base_url("http://127.0.0.1:8000").is_ok());
        assert!(validate_api_base_url("https://percapita.example.cl/").is_ok());
    }

    #[test]
    fn test_validate_api_base_url_rejects_empty() {
        let err = validate_api_base_url("  ").expect_err("should reject empty");
        assert!(
            matches!(err, PercapitaError::InvalidInput(msg) if msg.contains("cannot be empty"))
        );
    }

    #[test]
    fn test_validate_api_base_url_rejects_missing_scheme() {
        let err = validate_api_base_url("localhost:8000").expect_err("should reject");
        assert!(matches!(err, PercapitaError::InvalidInput(msg) if msg.contains("http://")));
    }

    #[test]
    fn test_validate_api_base_url_rejects_missing_host() {
        let err = validate_api_base_url("https://").expect_err("should reject");
        assert!(matches!(err, PercapitaError::InvalidInput(msg) if msg.contains("missing a host")));
    }

    #[test]
    fn test_validate_api_base_url_rejects_whitespace_and_non_ascii() {
        assert!(validate_api_base_url("http://local host").is_err());
        assert!(validate_api_base_url("http://señal.cl").is_err());
    }

    #[test]
    fn test_validate_api_base_url_rejects_too_long() {
        let url = format!("http://{}", "a".repeat(2048));
        let err = validate_api_base_url(&url).expect_err("should reject too long");
        assert!(matches!(
            err,
            PercapitaError::InvalidInput(msg) if msg.contains("exceeds maximum length")
        ));
    }

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#10B981").is_ok());
        assert!(validate_hex_color("#ef4444").is_ok());
        assert!(validate_hex_color("10B981").is_err());
        assert!(validate_hex_color("#10B98").is_err());
        assert!(validate_hex_color("#GGGGGG").is_err());
    }
}
