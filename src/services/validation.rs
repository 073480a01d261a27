// Portal Autologin - Connectivity Validation
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Periodic connectivity validation.
//!
//! While a profile stays active, its trigger URL is probed every
//! `validation_interval`. If the portal is back in the way the portal is
//! triggered again.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::orchestrator::PortalTrigger;
use crate::matching;
use crate::models::Profile;
use crate::network::{wifi_ssid, HostNetwork};

/// Shortest interval honored between probes.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one validation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// Connectivity looks fine.
    Clear,
    /// The portal intercepted the probe, or the probe failed.
    PortalDetected,
    /// The profile is no longer active or the network changed.
    Stop,
}

/// Running validation loop bound to one profile. Aborted on drop.
#[derive(Debug)]
pub struct ValidationTask {
    profile_id: String,
    handle: JoinHandle<()>,
}

impl ValidationTask {
    pub fn spawn(
        profile: Profile,
        network: Arc<dyn HostNetwork>,
        trigger: PortalTrigger,
        active: watch::Receiver<Option<String>>,
    ) -> Self {
        let profile_id = profile.id.clone();
        info!(
            profile_id = %profile_id,
            interval_ms = profile.validation_interval.as_millis() as u64,
            "Starting connectivity validation"
        );
        let handle = tokio::spawn(run(profile, network, trigger, active));
        Self { profile_id, handle }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ValidationTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn is_active(active: &watch::Receiver<Option<String>>, id: &str) -> bool {
    active.borrow().as_deref() == Some(id)
}

/// Run one validation round for `profile`.
pub async fn check_once(
    profile: &Profile,
    network: &dyn HostNetwork,
    trigger: &PortalTrigger,
    active: &watch::Receiver<Option<String>>,
) -> ValidationVerdict {
    if !is_active(active, &profile.id) {
        debug!(profile_id = %profile.id, "Profile no longer active");
        return ValidationVerdict::Stop;
    }

    match wifi_ssid(network).await {
        Some(ssid) if matching::matches(profile, &ssid) => {}
        other => {
            debug!(profile_id = %profile.id, ssid = ?other, "Network changed");
            return ValidationVerdict::Stop;
        }
    }

    match trigger.probe(&profile.trigger_url).await {
        Ok(response) if !response.indicates_portal(&profile.trigger_url) => {
            debug!(profile_id = %profile.id, status = response.status, "Connectivity OK");
            ValidationVerdict::Clear
        }
        Ok(response) => {
            info!(profile_id = %profile.id, status = response.status, url = %response.url, "Portal detected again");
            ValidationVerdict::PortalDetected
        }
        Err(e) if e.is_configuration_error() => {
            warn!(profile_id = %profile.id, "Cannot validate connectivity: {}", e);
            ValidationVerdict::Stop
        }
        Err(e) => {
            info!(profile_id = %profile.id, "Validation probe failed: {}", e);
            ValidationVerdict::PortalDetected
        }
    }
}

async fn run(
    profile: Profile,
    network: Arc<dyn HostNetwork>,
    trigger: PortalTrigger,
    active: watch::Receiver<Option<String>>,
) {
    let interval = profile.validation_interval.max(MIN_INTERVAL);
    loop {
        tokio::time::sleep(interval).await;
        match check_once(&profile, network.as_ref(), &trigger, &active).await {
            ValidationVerdict::Clear => {}
            ValidationVerdict::PortalDetected => {
                if !is_active(&active, &profile.id) {
                    break;
                }
                trigger.fire(&profile).await;
            }
            ValidationVerdict::Stop => break,
        }
    }
    debug!(profile_id = %profile.id, "Connectivity validation stopped");
}
