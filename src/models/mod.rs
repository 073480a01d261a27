// Portal Autologin - Data Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Data Models
//!
//! Shared types used by the daemon's control loops:
//!
//! - **Profile**: Captive portal profiles (SSID pattern, click targets, timings)
//! - **Config**: Tunable timings for the automation and network loops
//! - **Templates**: Built-in profiles for common portal providers
//! - **Validation**: Boundary checks applied before a profile is stored
//! - **Error**: Shared error types

pub mod config;
pub mod error;
pub mod profile;
pub mod templates;
pub mod validation;

pub use config::{AppConfig, AutomationConfig, NetworkConfig};
pub use error::{Error, Result};
pub use profile::{MatchKind, Profile};
pub use templates::{default_profiles, ProfileTemplate};
