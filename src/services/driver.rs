// Portal Autologin - Portal Drivers
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Pluggable strategies for getting through a portal once one is detected.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::automation::AutomationController;
use crate::models::{Error, Profile, Result};
use crate::ui::UiTree;

/// A strategy for handling a detected portal.
#[async_trait]
pub trait PortalDriver: Send + Sync {
    /// Start handling the portal for `profile`. Returns whether the driver
    /// accepted the job.
    async fn handle(&self, profile: &Profile) -> bool;

    /// Unique driver name.
    fn name(&self) -> &str;

    /// Whether the driver can run right now.
    fn is_available(&self) -> bool;
}

/// Ordered set of drivers with a selectable default.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn PortalDriver>>,
    default: Option<String>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver. The first one registered becomes the default.
    pub fn register(&mut self, driver: Arc<dyn PortalDriver>) {
        debug!("Registered portal driver {}", driver.name());
        if self.default.is_none() {
            self.default = Some(driver.name().to_string());
        }
        self.drivers.push(driver);
    }

    /// Make `name` the default driver.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.drivers.iter().any(|d| d.name() == name) {
            return Err(Error::DriverNotFound(name.to_string()));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Look up a driver by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn PortalDriver>> {
        self.drivers.iter().find(|d| d.name() == name).cloned()
    }

    /// The default driver if available, else the first available one.
    pub fn default_driver(&self) -> Option<Arc<dyn PortalDriver>> {
        self.default
            .as_deref()
            .and_then(|name| self.get(name))
            .filter(|d| d.is_available())
            .or_else(|| self.drivers.iter().find(|d| d.is_available()).cloned())
    }

    /// Registered driver names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }
}

/// Driver that arms the automation controller and lets UI change signals
/// do the rest.
pub struct AutomationDriver<T: UiTree> {
    controller: Arc<AutomationController<T>>,
    handoff_delay: Duration,
}

impl<T: UiTree> AutomationDriver<T> {
    pub const NAME: &'static str = "accessibility";

    pub fn new(controller: Arc<AutomationController<T>>, handoff_delay: Duration) -> Self {
        Self {
            controller,
            handoff_delay,
        }
    }
}

#[async_trait]
impl<T: UiTree> PortalDriver for AutomationDriver<T> {
    async fn handle(&self, profile: &Profile) -> bool {
        info!(profile_id = %profile.id, "Handing portal to accessibility automation");
        self.controller.arm(profile.clone());
        // Give the portal page time to appear before the caller moves on.
        tokio::time::sleep(self.handoff_delay).await;
        true
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_available(&self) -> bool {
        self.controller.tree().is_available()
    }
}
