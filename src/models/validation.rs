// Portal Autologin - Validation Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Boundary validation for portal profiles.
//!
//! Invalid profiles are rejected when they are added or updated. The
//! detection loop never sees these errors; a profile that slipped through
//! (hand-edited file) still degrades safely to "no match".

use regex::RegexBuilder;

use super::error::{Error, Result};
use super::profile::{MatchKind, Profile};
use crate::matching::REGEX_SIZE_LIMIT;

/// Validate a trigger URL: must parse and use http or https.
pub fn validate_trigger_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField("trigger_url"));
    }
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| Error::invalid_url(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::invalid_url(url, format!("unsupported scheme '{}'", other)));
        }
    }
    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(Error::invalid_url(url, "missing host"));
    }
    Ok(())
}

/// Validate an SSID pattern for the given match kind.
pub fn validate_ssid_pattern(pattern: &str, kind: MatchKind) -> Result<()> {
    if pattern.is_empty() {
        return Err(Error::MissingField("ssid"));
    }
    // IEEE 802.11 limits SSIDs to 32 octets; patterns may be longer.
    if kind == MatchKind::Exact && pattern.len() > 32 {
        return Err(Error::invalid_pattern(pattern, "SSID longer than 32 bytes"));
    }
    if kind == MatchKind::Regex {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
    }
    Ok(())
}

/// Validate a complete profile.
pub fn validate_profile(profile: &Profile) -> Result<()> {
    if profile.id.trim().is_empty() {
        return Err(Error::MissingField("id"));
    }
    validate_ssid_pattern(&profile.ssid, profile.match_type)?;
    validate_trigger_url(&profile.trigger_url)?;
    if !profile.has_click_targets() {
        return Err(Error::MissingField("click_text"));
    }
    if profile.enable_validation && profile.validation_interval.is_zero() {
        return Err(Error::InvalidProfile(
            "validation interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_profile() -> Profile {
        let mut p = Profile::new(".*Airport.*", MatchKind::Regex, "http://captive.apple.com");
        p.click_text_contains = vec!["Accept".to_string()];
        p
    }

    #[test]
    fn test_valid_profile() {
        assert!(validate_profile(&valid_profile()).is_ok());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut p = valid_profile();
        p.ssid = "(unclosed".to_string();
        assert!(matches!(validate_profile(&p), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_trigger_url() {
        assert!(validate_trigger_url("http://www.msftconnecttest.com/redirect").is_ok());
        assert!(validate_trigger_url("https://example.com").is_ok());
        assert!(matches!(validate_trigger_url(""), Err(Error::MissingField("trigger_url"))));
        assert!(validate_trigger_url("ftp://example.com").is_err());
        assert!(validate_trigger_url("not a url").is_err());
    }

    #[test]
    fn test_missing_click_targets() {
        let mut p = valid_profile();
        p.click_text_contains = vec!["  ".to_string()];
        assert!(matches!(validate_profile(&p), Err(Error::MissingField("click_text"))));
        p.click_text_exact = Some("I Agree".to_string());
        assert!(validate_profile(&p).is_ok());
    }

    #[test]
    fn test_zero_validation_interval_rejected() {
        let mut p = valid_profile();
        p.enable_validation = true;
        p.validation_interval = std::time::Duration::ZERO;
        assert!(matches!(validate_profile(&p), Err(Error::InvalidProfile(_))));
    }

    #[test]
    fn test_exact_ssid_length() {
        assert!(validate_ssid_pattern("Cafe", MatchKind::Exact).is_ok());
        assert!(validate_ssid_pattern(&"x".repeat(33), MatchKind::Exact).is_err());
        assert!(validate_ssid_pattern(&"x".repeat(33), MatchKind::Contains).is_ok());
    }
}
