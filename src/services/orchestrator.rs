// Portal Autologin - Network Orchestrator
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Network orchestrator.
//!
//! A single task that owns the network session. It turns connectivity
//! events into debounced profile checks, applies per-profile cooldowns,
//! re-triggers on quick reconnections and keeps at most one validation
//! task running for the active profile.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::driver::DriverRegistry;
use super::validation::ValidationTask;
use crate::matching;
use crate::models::{NetworkConfig, Profile, Result};
use crate::network::{wifi_ssid, HostNetwork, NetworkEvent, PortalProbe, ProbeResponse};
use crate::storage::ProfileSource;

/// Sends the trigger request and hands the portal to the default driver.
#[derive(Clone)]
pub struct PortalTrigger {
    probe: Arc<dyn PortalProbe>,
    drivers: Arc<DriverRegistry>,
}

impl PortalTrigger {
    pub fn new(probe: Arc<dyn PortalProbe>, drivers: Arc<DriverRegistry>) -> Self {
        Self { probe, drivers }
    }

    /// Probe `url` without any further action.
    pub async fn probe(&self, url: &str) -> Result<ProbeResponse> {
        self.probe.probe(url).await
    }

    /// Trigger the portal for `profile`. Returns whether a driver took it.
    pub async fn fire(&self, profile: &Profile) -> bool {
        match self.probe.probe(&profile.trigger_url).await {
            Ok(response) => debug!(
                profile_id = %profile.id,
                trigger_url = %profile.trigger_url,
                status = response.status,
                "Trigger request answered"
            ),
            Err(e) if e.is_configuration_error() => warn!(
                profile_id = %profile.id,
                trigger_url = %profile.trigger_url,
                "Trigger request not sent: {}", e
            ),
            Err(e) => debug!(
                profile_id = %profile.id,
                trigger_url = %profile.trigger_url,
                "Trigger request failed: {}", e
            ),
        }

        match self.drivers.default_driver() {
            Some(driver) => {
                info!(profile_id = %profile.id, driver = driver.name(), "Triggering portal");
                driver.handle(profile).await
            }
            None => {
                warn!(profile_id = %profile.id, "No portal driver available");
                false
            }
        }
    }
}

/// State carried between events.
#[derive(Debug, Default)]
struct NetworkSession {
    last_ssid: Option<String>,
    last_trigger: Option<(String, Instant)>,
    last_disconnect: Option<Instant>,
    profile_at_disconnect: Option<Profile>,
    active: Option<Profile>,
    trigger: Option<JoinHandle<()>>,
    validation: Option<ValidationTask>,
}

/// Reacts to network changes for the lifetime of the daemon.
pub struct NetworkOrchestrator {
    network: Arc<dyn HostNetwork>,
    profiles: Arc<dyn ProfileSource>,
    trigger: PortalTrigger,
    config: NetworkConfig,
    active_tx: watch::Sender<Option<String>>,
    session: NetworkSession,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl NetworkOrchestrator {
    pub fn new(
        network: Arc<dyn HostNetwork>,
        probe: Arc<dyn PortalProbe>,
        profiles: Arc<dyn ProfileSource>,
        drivers: Arc<DriverRegistry>,
        config: NetworkConfig,
    ) -> Self {
        let (active_tx, _) = watch::channel(None);
        Self {
            network,
            profiles,
            trigger: PortalTrigger::new(probe, drivers),
            config,
            active_tx,
            session: NetworkSession::default(),
        }
    }

    /// Watch the ID of the active profile.
    pub fn active_profile(&self) -> watch::Receiver<Option<String>> {
        self.active_tx.subscribe()
    }

    /// Consume events until the sender side closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<NetworkEvent>) {
        info!("Network orchestrator started");
        let mut deadline: Option<Instant> = None;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_event(event, &mut deadline).await,
                    None => break,
                },
                _ = sleep_until(deadline), if deadline.is_some() => {
                    deadline = None;
                    self.check_and_trigger().await;
                }
            }
        }
        self.stop_trigger();
        self.stop_validation();
        info!("Network orchestrator stopped");
    }

    async fn on_event(&mut self, event: NetworkEvent, deadline: &mut Option<Instant>) {
        debug!("Network event {:?}", event);
        match event {
            NetworkEvent::Lost => {
                let session = &mut self.session;
                session.last_disconnect = Some(Instant::now());
                session.profile_at_disconnect = session.active.take();
                session.last_ssid = None;
                *deadline = None;
                self.set_active(None);
                self.stop_trigger();
                self.stop_validation();
            }
            NetworkEvent::Available => {
                self.handle_reconnection();
                *deadline = Some(Instant::now() + self.config.debounce());
            }
            NetworkEvent::CapabilitiesChanged { wifi: true } => {
                *deadline = Some(Instant::now() + self.config.debounce());
            }
            NetworkEvent::CapabilitiesChanged { wifi: false } => {}
        }
    }

    /// Re-trigger right away when the network comes back shortly after a
    /// drop and the profile active at the drop asks for it.
    fn handle_reconnection(&mut self) {
        // Only the first reconnection after a drop may re-trigger.
        let Some(profile) = self.session.profile_at_disconnect.take() else {
            return;
        };
        let Some(lost_at) = self.session.last_disconnect else {
            return;
        };
        if lost_at.elapsed() > self.config.reconnection_window() {
            return;
        }
        if !profile.enable_reconnection_handling {
            return;
        }

        info!(profile_id = %profile.id, "Reconnection detected, re-triggering portal");
        self.session.last_trigger = Some((profile.id.clone(), Instant::now()));
        self.set_active(Some(profile.clone()));
        self.spawn_trigger(profile);
    }

    async fn check_and_trigger(&mut self) {
        let Some(ssid) = wifi_ssid(self.network.as_ref()).await else {
            debug!("No Wi-Fi network name available");
            return;
        };
        if self.session.last_ssid.as_deref() == Some(ssid.as_str()) {
            return;
        }
        self.session.last_ssid = Some(ssid.clone());

        let source = Arc::clone(&self.profiles);
        let profiles = tokio::task::spawn_blocking(move || source.load_profiles())
            .await
            .unwrap_or_else(|e| {
                error!("Failed to load profiles: {}", e);
                Vec::new()
            });

        let Some(profile) = profiles
            .into_iter()
            .find(|p| p.enabled && matching::matches(p, &ssid))
        else {
            debug!(ssid = %ssid, "No profile matches");
            self.stop_validation();
            self.set_active(None);
            return;
        };

        let now = Instant::now();
        let cooling_down = matches!(
            &self.session.last_trigger,
            Some((id, at)) if *id == profile.id && now.duration_since(*at) < profile.cooldown
        );

        if cooling_down {
            info!(profile_id = %profile.id, ssid = %ssid, "Profile in cooldown, not triggering");
            if self.active_id() != Some(profile.id.as_str()) {
                self.set_active(Some(profile.clone()));
            }
        } else {
            info!(profile_id = %profile.id, ssid = %ssid, "Profile matched");
            self.set_active(Some(profile.clone()));
            self.session.last_trigger = Some((profile.id.clone(), now));
            self.spawn_trigger(profile.clone());
        }

        if profile.enable_validation {
            self.start_validation(profile);
        }
    }

    fn active_id(&self) -> Option<&str> {
        self.session.active.as_ref().map(|p| p.id.as_str())
    }

    fn set_active(&mut self, profile: Option<Profile>) {
        if self.active_id() != profile.as_ref().map(|p| p.id.as_str()) {
            // Work started for the previous profile no longer applies.
            self.stop_trigger();
            self.stop_validation();
        }
        let id = profile.as_ref().map(|p| p.id.clone());
        self.session.active = profile;
        self.active_tx.send_replace(id);
    }

    fn spawn_trigger(&mut self, profile: Profile) {
        self.stop_trigger();
        let trigger = self.trigger.clone();
        self.session.trigger = Some(tokio::spawn(async move {
            trigger.fire(&profile).await;
        }));
    }

    fn stop_trigger(&mut self) {
        if let Some(handle) = self.session.trigger.take() {
            handle.abort();
        }
    }

    fn start_validation(&mut self, profile: Profile) {
        self.stop_validation();
        self.session.validation = Some(ValidationTask::spawn(
            profile,
            Arc::clone(&self.network),
            self.trigger.clone(),
            self.active_tx.subscribe(),
        ));
    }

    fn stop_validation(&mut self) {
        if let Some(task) = self.session.validation.take() {
            debug!(profile_id = task.profile_id(), "Stopping connectivity validation");
        }
    }
}
