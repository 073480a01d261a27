// Portal Autologin - Application Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Application configuration model.
//!
//! Every timeout, delay and retry count used by the control loops lives
//! here so it can be tuned from `settings.toml` without touching code.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for the automation controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Delay between a UI change signal and the first click attempt.
    #[serde(default = "default_click_settle_delay")]
    pub click_settle_delay_ms: u64,

    /// Number of click attempts before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before each retry; the last entry repeats.
    #[serde(default = "default_retry_delays")]
    pub retry_delays_ms: Vec<u64>,

    /// How long the automation driver waits after arming the controller.
    #[serde(default = "default_driver_handoff_delay")]
    pub driver_handoff_delay_ms: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            click_settle_delay_ms: default_click_settle_delay(),
            max_retries: default_max_retries(),
            retry_delays_ms: default_retry_delays(),
            driver_handoff_delay_ms: default_driver_handoff_delay(),
        }
    }
}

impl AutomationConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.click_settle_delay_ms)
    }

    pub fn handoff_delay(&self) -> Duration {
        Duration::from_millis(self.driver_handoff_delay_ms)
    }

    /// Backoff before retry number `retry` (1-based).
    ///
    /// Delays never decrease from one retry to the next, even if the
    /// configured list is out of order.
    pub fn retry_delay(&self, retry: u32) -> Duration {
        if self.retry_delays_ms.is_empty() {
            return Duration::ZERO;
        }
        let index = (retry.max(1) as usize - 1).min(self.retry_delays_ms.len() - 1);
        let millis = self.retry_delays_ms[..=index].iter().copied().max().unwrap_or(0);
        Duration::from_millis(millis)
    }
}

/// Timing knobs for the network orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Window used to collapse bursts of network events.
    #[serde(default = "default_debounce")]
    pub network_debounce_ms: u64,

    /// A connect within this time after a disconnect counts as a reconnection.
    #[serde(default = "default_reconnection_window")]
    pub reconnection_window_ms: u64,

    /// Connect timeout for portal probes.
    #[serde(default = "default_probe_timeout")]
    pub probe_connect_timeout_ms: u64,

    /// Total request timeout for portal probes.
    #[serde(default = "default_probe_timeout")]
    pub probe_read_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_debounce_ms: default_debounce(),
            reconnection_window_ms: default_reconnection_window(),
            probe_connect_timeout_ms: default_probe_timeout(),
            probe_read_timeout_ms: default_probe_timeout(),
        }
    }
}

impl NetworkConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.network_debounce_ms)
    }

    pub fn reconnection_window(&self) -> Duration {
        Duration::from_millis(self.reconnection_window_ms)
    }

    pub fn probe_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_connect_timeout_ms)
    }

    pub fn probe_read_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_read_timeout_ms)
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Show desktop notifications for portal outcomes.
    #[serde(default = "default_true")]
    pub show_notifications: bool,

    /// Automation controller timings.
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Network orchestrator timings.
    #[serde(default)]
    pub network: NetworkConfig,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_click_settle_delay() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delays() -> Vec<u64> {
    vec![1000, 2000]
}

fn default_driver_handoff_delay() -> u64 {
    500
}

fn default_debounce() -> u64 {
    1000
}

fn default_reconnection_window() -> u64 {
    30_000
}

fn default_probe_timeout() -> u64 {
    5000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            show_notifications: true,
            automation: AutomationConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, using defaults when the file does not exist.
    pub fn load(path: &std::path::Path) -> Result<Self, super::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Save configuration to TOML file with restrictive permissions (0600).
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), super::Error> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.network.debounce(), Duration::from_millis(1000));
        assert_eq!(config.network.reconnection_window(), Duration::from_secs(30));
        assert_eq!(config.automation.max_retries, 3);
    }

    #[test]
    fn test_partial_override() {
        let config: AppConfig = toml::from_str(
            r#"
            show_notifications = false

            [automation]
            max_retries = 5
            "#,
        )
        .expect("config parses");
        assert!(!config.show_notifications);
        assert_eq!(config.automation.max_retries, 5);
        assert_eq!(config.automation.retry_delays_ms, vec![1000, 2000]);
    }

    #[test]
    fn test_retry_delay_escalates() {
        let config = AutomationConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_millis(1000));
        assert_eq!(config.retry_delay(2), Duration::from_millis(2000));
        assert_eq!(config.retry_delay(7), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_delay_never_decreases() {
        let config = AutomationConfig {
            retry_delays_ms: vec![3000, 1000],
            ..AutomationConfig::default()
        };
        assert_eq!(config.retry_delay(1), Duration::from_millis(3000));
        assert_eq!(config.retry_delay(2), Duration::from_millis(3000));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("portal-autologin-no-such-settings.toml");
        assert_eq!(AppConfig::load(&path).expect("defaults"), AppConfig::default());
    }

    #[test]
    fn test_corrupt_file_reports_error() {
        let path = std::env::temp_dir().join(format!(
            "portal-autologin-bad-settings-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "log_level = [not toml").expect("write");
        let result = AppConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(crate::models::Error::ConfigParseFailed(_))));
    }
}
