// Portal Autologin - Profile Data Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Portal profile data model and serialization.
//!
//! A Profile describes one family of captive portal networks:
//! - How to recognise the network (SSID pattern + match kind)
//! - Which URL surfaces the portal page
//! - Which control on the portal page accepts the terms
//! - Timing (post-success hold, cooldown, validation interval)
//!
//! Profiles are immutable values once handed to the daemon. The
//! orchestrator clones the profile it matched and works on that snapshot.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Default interval between connectivity validations (5 minutes).
pub const DEFAULT_VALIDATION_INTERVAL: Duration = Duration::from_millis(300_000);

/// Default post-success hold time.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default minimum time between triggers of the same profile.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(5_000);

/// How a profile's SSID pattern is compared to the observed network name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Case-sensitive equality.
    #[default]
    Exact,
    /// Case-insensitive substring.
    Contains,
    /// Case-insensitive regular expression search.
    Regex,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }
}

/// A captive portal profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique profile identifier.
    pub id: String,

    /// SSID pattern, interpreted according to `match_type`.
    pub ssid: String,

    /// How `ssid` is matched.
    #[serde(default)]
    pub match_type: MatchKind,

    /// URL requested to surface the portal page.
    pub trigger_url: String,

    /// Exact (case-insensitive) text of the control to activate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_text_exact: Option<String>,

    /// Substrings tried in order when no exact match exists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub click_text_contains: Vec<String>,

    /// How long a successful session is held before returning to idle.
    #[serde(rename = "timeout_ms", with = "duration_ms", default = "default_timeout")]
    pub timeout: Duration,

    /// Minimum time between two triggers of this profile.
    #[serde(rename = "cooldown_ms", with = "duration_ms", default = "default_cooldown")]
    pub cooldown: Duration,

    /// Whether the profile takes part in matching.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Periodically re-check that the portal has not come back.
    #[serde(default)]
    pub enable_validation: bool,

    /// Interval between validation probes.
    #[serde(
        rename = "validation_interval_ms",
        with = "duration_ms",
        default = "default_validation_interval"
    )]
    pub validation_interval: Duration,

    /// Re-trigger the portal when the network comes back shortly after a drop.
    #[serde(default)]
    pub enable_reconnection_handling: bool,
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_cooldown() -> Duration {
    DEFAULT_COOLDOWN
}

fn default_validation_interval() -> Duration {
    DEFAULT_VALIDATION_INTERVAL
}

impl Profile {
    /// Create a new enabled profile with a random ID and default timings.
    pub fn new(
        ssid: impl Into<String>,
        match_type: MatchKind,
        trigger_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ssid: ssid.into(),
            match_type,
            trigger_url: trigger_url.into(),
            click_text_exact: None,
            click_text_contains: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            cooldown: DEFAULT_COOLDOWN,
            enabled: true,
            enable_validation: false,
            validation_interval: DEFAULT_VALIDATION_INTERVAL,
            enable_reconnection_handling: false,
        }
    }

    /// Get the profile ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if the profile names any control to activate.
    pub fn has_click_targets(&self) -> bool {
        self.click_text_exact
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
            || self.click_text_contains.iter().any(|t| !t.trim().is_empty())
    }

    /// Serialize a profile list to pretty JSON.
    pub fn list_to_json(profiles: &[Profile]) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(profiles)
    }

    /// Deserialize a profile list from JSON.
    pub fn list_from_json(s: &str) -> Result<Vec<Profile>, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
