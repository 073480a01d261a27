// Portal Autologin - Profile Templates
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Predefined profile templates for common captive portal providers.
//!
//! Templates provide a quick way to create profiles for typical venues
//! like airports, hotels or coffee chains. The default profile list is
//! built from two of them.

use std::time::Duration;

use super::profile::{MatchKind, Profile, DEFAULT_VALIDATION_INTERVAL};

const APPLE_CAPTIVE_URL: &str = "http://captive.apple.com";
const MSFT_CAPTIVE_URL: &str = "http://www.msftconnecttest.com/redirect";

/// Available profile templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTemplate {
    Airport,
    Hotel,
    Cafe,
    Starbucks,
    McDonalds,
    AirportLounge,
    TrainStation,
    ShoppingMall,
}

impl ProfileTemplate {
    /// Get all available templates.
    pub fn all() -> &'static [ProfileTemplate] {
        &[
            Self::Airport,
            Self::Hotel,
            Self::Cafe,
            Self::Starbucks,
            Self::McDonalds,
            Self::AirportLounge,
            Self::TrainStation,
            Self::ShoppingMall,
        ]
    }

    /// Find a template by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.name() == name)
    }

    /// Get the template name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Airport => "Airport Wi-Fi",
            Self::Hotel => "Hotel Wi-Fi",
            Self::Cafe => "Cafe/Restaurant",
            Self::Starbucks => "Starbucks",
            Self::McDonalds => "McDonald's",
            Self::AirportLounge => "Airport Lounge",
            Self::TrainStation => "Train Station",
            Self::ShoppingMall => "Shopping Mall",
        }
    }

    /// Get the template description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Airport => "Common airport captive portals",
            Self::Hotel => "Hotel guest network portals",
            Self::Cafe => "Coffee shops and restaurants",
            Self::Starbucks => "Starbucks Wi-Fi networks",
            Self::McDonalds => "McDonald's Wi-Fi networks",
            Self::AirportLounge => "Premium airport lounge networks",
            Self::TrainStation => "Railway station Wi-Fi networks",
            Self::ShoppingMall => "Shopping center Wi-Fi networks",
        }
    }

    /// SSID regex used when the user does not supply one.
    pub fn default_ssid(&self) -> &'static str {
        match self {
            Self::Airport => ".*Airport.*",
            Self::Hotel => ".*Hotel.*|.*Guest.*|.*WiFi.*",
            Self::Cafe => ".*Cafe.*|.*Coffee.*|.*Restaurant.*",
            Self::Starbucks => ".*Starbucks.*|.*GoogleStarbucks.*",
            Self::McDonalds => ".*McDonald.*|.*McD.*",
            Self::AirportLounge => ".*Lounge.*|.*Priority.*",
            Self::TrainStation => ".*Station.*|.*Train.*|.*Railway.*",
            Self::ShoppingMall => ".*Mall.*|.*Shopping.*|.*Center.*",
        }
    }

    fn trigger_url(&self) -> &'static str {
        match self {
            Self::Airport | Self::Cafe | Self::AirportLounge | Self::ShoppingMall => {
                APPLE_CAPTIVE_URL
            }
            Self::Hotel | Self::Starbucks | Self::McDonalds | Self::TrainStation => {
                MSFT_CAPTIVE_URL
            }
        }
    }

    fn click_texts(&self) -> &'static [&'static str] {
        match self {
            Self::Airport => &["Accept", "Connect", "Continue", "Agree", "I Agree"],
            Self::Hotel => &["Accept", "Agree", "Continue", "Connect", "Get Started"],
            Self::Starbucks => &["Accept", "Agree", "Continue"],
            Self::McDonalds => &["Accept", "Agree", "Continue", "Get Started"],
            Self::AirportLounge => &["Accept", "Connect", "Continue"],
            Self::Cafe | Self::TrainStation | Self::ShoppingMall => {
                &["Accept", "Agree", "Continue", "Connect"]
            }
        }
    }

    /// Create a profile from this template.
    pub fn create_profile(&self, custom_ssid: Option<&str>) -> Profile {
        let ssid = custom_ssid.unwrap_or_else(|| self.default_ssid());
        let mut profile = Profile::new(ssid, MatchKind::Regex, self.trigger_url());
        profile.click_text_contains = self.click_texts().iter().map(|s| s.to_string()).collect();
        profile.timeout = match self {
            Self::Hotel => Duration::from_millis(15_000),
            _ => Duration::from_millis(10_000),
        };
        profile.cooldown = Duration::from_millis(5_000);
        profile.enable_validation = matches!(self, Self::Airport | Self::AirportLounge);
        profile.validation_interval = DEFAULT_VALIDATION_INTERVAL;
        profile.enable_reconnection_handling = matches!(self, Self::Hotel);
        profile
    }
}

/// Profiles installed when no usable profile file exists.
pub fn default_profiles() -> Vec<Profile> {
    let mut airport = ProfileTemplate::Airport.create_profile(None);
    airport.id = "default-airport".to_string();
    airport.click_text_contains = vec!["Accept".into(), "Connect".into(), "Continue".into()];
    airport.enable_validation = false;

    let mut starbucks = ProfileTemplate::Starbucks.create_profile(Some(".*Starbucks.*"));
    starbucks.id = "default-starbucks".to_string();

    vec![airport, starbucks]
}
