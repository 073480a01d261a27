// Portal Autologin - SSID Match Engine
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! SSID matching for portal profiles.
//!
//! Each [`MatchKind`] maps to a shared [`MatchStrategy`]. Matching never
//! fails: a malformed regex simply does not match anything.

use crate::models::{MatchKind, Profile};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tracing::warn;

/// Maximum compiled regex size to bound matching cost (64 KiB).
pub const REGEX_SIZE_LIMIT: usize = 1 << 16;

/// A way of comparing an SSID pattern with an observed network name.
pub trait MatchStrategy: Send + Sync {
    fn matches(&self, pattern: &str, ssid: &str) -> bool;
}

/// Case-sensitive equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn matches(&self, pattern: &str, ssid: &str) -> bool {
        ssid == pattern
    }
}

/// Case-insensitive substring test.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainsMatch;

impl MatchStrategy for ContainsMatch {
    fn matches(&self, pattern: &str, ssid: &str) -> bool {
        contains_ignore_case(ssid, pattern)
    }
}

/// Case-insensitive, unanchored regular expression search.
///
/// Compiled patterns are cached by pattern string. A pattern that fails to
/// compile is cached as `None` and only reported once.
#[derive(Debug, Default)]
pub struct RegexMatch {
    cache: OnceLock<Mutex<HashMap<String, Option<Regex>>>>,
}

impl RegexMatch {
    pub const fn new() -> Self {
        Self {
            cache: OnceLock::new(),
        }
    }

    fn compile(pattern: &str) -> Option<Regex> {
        match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .dfa_size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid SSID regex '{}': {}", pattern, e);
                None
            }
        }
    }

    fn get_or_compile(&self, pattern: &str) -> Option<Regex> {
        let mut cache = self
            .cache
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        cache
            .entry(pattern.to_string())
            .or_insert_with(|| Self::compile(pattern))
            .clone()
    }
}

impl MatchStrategy for RegexMatch {
    fn matches(&self, pattern: &str, ssid: &str) -> bool {
        self.get_or_compile(pattern)
            .is_some_and(|re| re.is_match(ssid))
    }
}

static EXACT: ExactMatch = ExactMatch;
static CONTAINS: ContainsMatch = ContainsMatch;
static REGEX: RegexMatch = RegexMatch::new();

impl MatchKind {
    /// Strategy implementing this match kind.
    pub fn strategy(&self) -> &'static dyn MatchStrategy {
        match self {
            Self::Exact => &EXACT,
            Self::Contains => &CONTAINS,
            Self::Regex => &REGEX,
        }
    }
}

/// Check whether `ssid` matches the profile's SSID pattern.
pub fn matches(profile: &Profile, ssid: &str) -> bool {
    profile.match_type.strategy().matches(&profile.ssid, ssid)
}

/// Case-insensitive substring test shared with the UI search.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive equality shared with the UI search.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
