// Portal Autologin - Notifications
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! User-facing success and failure notifications.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use zbus::zvariant::Value;
use zbus::Connection;

use crate::models::{Error, Result};
use crate::APP_NAME;

const NOTIFICATIONS_SERVICE: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const NOTIFICATION_ICON: &str = "network-wireless";
const NOTIFICATION_EXPIRE_MS: i32 = 5000;

/// Outcome of an automation session worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalNotification {
    /// The portal control was activated.
    Success { profile_id: String, ssid: String },
    /// Every attempt failed.
    Failure {
        profile_id: String,
        ssid: String,
        attempts: u32,
    },
}

impl PortalNotification {
    pub fn profile_id(&self) -> &str {
        match self {
            Self::Success { profile_id, .. } | Self::Failure { profile_id, .. } => profile_id,
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::Success { .. } => "Portal accepted",
            Self::Failure { .. } => "Portal login failed",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Success { ssid, .. } => format!("Signed in to {}", ssid),
            Self::Failure { ssid, attempts, .. } => {
                format!("Could not accept the portal on {} after {} attempts", ssid, attempts)
            }
        }
    }
}

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: PortalNotification) -> Result<()>;
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: PortalNotification) -> Result<()> {
        info!(
            profile_id = notification.profile_id(),
            "{}: {}",
            notification.summary(),
            notification.body()
        );
        Ok(())
    }
}

/// Desktop notifications over `org.freedesktop.Notifications`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    conn: Connection,
}

impl DesktopNotifier {
    /// Connect to the session bus.
    pub async fn connect() -> Result<Self> {
        let conn = Connection::session()
            .await
            .map_err(|e| Error::NotificationFailed(e.to_string()))?;
        debug!("Connected to session bus for notifications");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: PortalNotification) -> Result<()> {
        let actions: Vec<&str> = Vec::new();
        let hints: HashMap<&str, Value<'_>> = HashMap::new();
        let body = notification.body();
        self.conn
            .call_method(
                Some(NOTIFICATIONS_SERVICE),
                NOTIFICATIONS_PATH,
                Some(NOTIFICATIONS_SERVICE),
                "Notify",
                &(
                    APP_NAME,
                    0u32,
                    NOTIFICATION_ICON,
                    notification.summary(),
                    body.as_str(),
                    actions,
                    hints,
                    NOTIFICATION_EXPIRE_MS,
                ),
            )
            .await
            .map_err(|e| {
                warn!("Desktop notification failed: {}", e);
                Error::NotificationFailed(e.to_string())
            })?;
        Ok(())
    }
}
