// Portal Autologin - Library Root
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Portal Autologin
//!
//! Detects captive portal Wi-Fi networks by SSID and accepts their terms
//! page automatically by activating the matching control through the
//! accessibility bus.
//!
//! - **models**: Profiles, configuration, templates, errors
//! - **matching**: SSID match engine
//! - **storage**: JSON profile store
//! - **network**: Host network state and HTTP portal probes
//! - **ui**: Accessibility tree abstraction and control search
//! - **services**: Automation controller, drivers, network orchestrator

pub mod matching;
pub mod models;
pub mod network;
pub mod services;
pub mod storage;
pub mod ui;

pub use models::{AppConfig, Error, MatchKind, Profile, Result};

/// Human-readable application name.
pub const APP_NAME: &str = "Portal Autologin";

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "portal-autologin";
