// Portal Autologin - Service Test Doubles
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Recording stand-ins for the host seams used by service tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::driver::PortalDriver;
use super::notify::{Notifier, PortalNotification};
use crate::models::{Error, Profile, Result};
use crate::network::{HostNetwork, PortalProbe, ProbeResponse};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<PortalNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<PortalNotification> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: PortalNotification) -> Result<()> {
        lock(&self.sent).push(notification);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeNetwork {
    ssid: Mutex<Option<String>>,
    wifi: AtomicBool,
}

impl FakeNetwork {
    pub fn new(ssid: Option<&str>) -> Self {
        Self {
            ssid: Mutex::new(ssid.map(str::to_string)),
            wifi: AtomicBool::new(true),
        }
    }

    pub fn set_ssid(&self, ssid: Option<&str>) {
        *lock(&self.ssid) = ssid.map(str::to_string);
    }
}

#[async_trait]
impl HostNetwork for FakeNetwork {
    async fn current_ssid(&self) -> Option<String> {
        lock(&self.ssid).clone()
    }

    async fn has_wifi_transport(&self) -> bool {
        self.wifi.load(Ordering::SeqCst)
    }
}

/// Probe that answers either "clear" (204 from the requested URL) or
/// "portal" (302) after an optional delay, and records every request.
#[derive(Debug, Default)]
pub struct FakeProbe {
    portal: AtomicBool,
    fail: AtomicBool,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn set_portal(&self, portal: bool) {
        self.portal.store(portal, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }
}

#[async_trait]
impl PortalProbe for FakeProbe {
    async fn probe(&self, url: &str) -> Result<ProbeResponse> {
        reqwest::Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;
        lock(&self.calls).push(url.to_string());
        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::ProbeFailed("connection refused".into()));
        }
        let status = if self.portal.load(Ordering::SeqCst) { 302 } else { 204 };
        Ok(ProbeResponse {
            status,
            url: url.to_string(),
        })
    }
}

/// Driver that records which profiles it was asked to handle and when.
#[derive(Debug)]
pub struct CountingDriver {
    name: String,
    available: AtomicBool,
    handled: Mutex<Vec<(String, Instant)>>,
}

impl CountingDriver {
    pub fn new(name: &str, available: bool) -> Self {
        Self {
            name: name.to_string(),
            available: AtomicBool::new(available),
            handled: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn handled(&self) -> Vec<String> {
        lock(&self.handled).iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn handled_at(&self) -> Vec<Instant> {
        lock(&self.handled).iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl PortalDriver for CountingDriver {
    async fn handle(&self, profile: &Profile) -> bool {
        lock(&self.handled).push((profile.id.clone(), Instant::now()));
        true
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
