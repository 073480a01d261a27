// Portal Autologin - NetworkManager Adapter
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! NetworkManager adapter.
//!
//! Connectivity changes come from NetworkManager's `StateChanged` and
//! `PropertiesChanged` signals on the system bus. The SSID and transport
//! are read through `nmcli`, which already resolves the active access point.

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Command;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use zbus::message::Type as MessageType;
use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, MatchRule, MessageStream};

use super::{HostNetwork, NetworkEvent};
use crate::models::{Error, Result};

const NM_SERVICE: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";

/// `NM_STATE_CONNECTED_LOCAL`; captive portals usually report this or
/// `CONNECTED_SITE` until the terms are accepted.
const NM_STATE_CONNECTED_LOCAL: u32 = 50;
/// `NM_STATE_CONNECTING`
const NM_STATE_CONNECTING: u32 = 40;

const WIRELESS_CONNECTION_TYPE: &str = "802-11-wireless";

/// Map a NetworkManager global state to an event.
pub fn event_for_state(state: u32) -> Option<NetworkEvent> {
    match state {
        s if s >= NM_STATE_CONNECTED_LOCAL => Some(NetworkEvent::Available),
        NM_STATE_CONNECTING => None,
        _ => Some(NetworkEvent::Lost),
    }
}

/// Parse `nmcli -t -f active,ssid dev wifi` output.
fn parse_active_ssid(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("yes:"))
        .map(|ssid| ssid.replace("\\:", ":"))
        .map(|ssid| ssid.trim().trim_matches('"').to_string())
        .filter(|ssid| !ssid.is_empty())
}

/// Parse `nmcli -t -f TYPE,STATE device` output.
fn parse_wifi_connected(stdout: &str) -> bool {
    stdout.lines().any(|line| {
        line.split_once(':')
            .map(|(kind, state)| kind == "wifi" && state.starts_with("connected"))
            .unwrap_or(false)
    })
}

fn run_nmcli(args: &[&str]) -> Option<String> {
    let output = Command::new("nmcli").args(args).output().ok()?;
    if !output.status.success() {
        debug!("nmcli {:?} exited with {}", args, output.status);
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn nmcli(args: &'static [&'static str]) -> Option<String> {
    tokio::task::spawn_blocking(move || run_nmcli(args))
        .await
        .ok()
        .flatten()
}

/// NetworkManager backed [`HostNetwork`].
#[derive(Debug, Clone, Default)]
pub struct NmNetwork;

impl NmNetwork {
    pub fn new() -> Self {
        Self
    }

    /// Forward NetworkManager connectivity changes into `sink` until the
    /// bus or the receiver goes away.
    pub async fn watch_events(&self, sink: mpsc::Sender<NetworkEvent>) -> Result<()> {
        let conn = Connection::system()
            .await
            .map_err(|e| Error::NetworkManagerDbus(e.to_string()))?;

        if let Some(event) = current_state(&conn).await.and_then(event_for_state) {
            debug!("Initial network state: {:?}", event);
            if sink.send(event).await.is_err() {
                return Ok(());
            }
        }

        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .path(NM_PATH)?
            .build();
        let stream = MessageStream::for_match_rule(rule, &conn, Some(64)).await?;
        tokio::pin!(stream);

        info!("Watching NetworkManager state");
        while let Some(msg) = stream.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("NetworkManager signal error: {}", e);
                    continue;
                }
            };
            let member = msg.header().member().map(|m| m.to_string());
            let event = match member.as_deref() {
                Some("StateChanged") => msg
                    .body()
                    .deserialize::<u32>()
                    .ok()
                    .and_then(event_for_state),
                Some("PropertiesChanged") => msg
                    .body()
                    .deserialize::<(String, HashMap<String, OwnedValue>, Vec<String>)>()
                    .ok()
                    .and_then(|(_, changed, _)| primary_type_event(&changed)),
                _ => None,
            };
            if let Some(event) = event {
                debug!("Network event: {:?}", event);
                if sink.send(event).await.is_err() {
                    break;
                }
            }
        }
        Ok(())
    }
}

fn primary_type_event(changed: &HashMap<String, OwnedValue>) -> Option<NetworkEvent> {
    match changed.get("PrimaryConnectionType").map(|v| &**v) {
        Some(Value::Str(kind)) => Some(NetworkEvent::CapabilitiesChanged {
            wifi: kind.as_str() == WIRELESS_CONNECTION_TYPE,
        }),
        _ => None,
    }
}

async fn current_state(conn: &Connection) -> Option<u32> {
    let reply = conn
        .call_method(
            Some(NM_SERVICE),
            NM_PATH,
            Some(PROPERTIES_IFACE),
            "Get",
            &(NM_SERVICE, "State"),
        )
        .await
        .map_err(|e| debug!("Failed to read NetworkManager state: {}", e))
        .ok()?;
    let body = reply.body();
    let value: Value<'_> = body.deserialize().ok()?;
    match value {
        Value::U32(state) => Some(state),
        _ => None,
    }
}

#[async_trait]
impl HostNetwork for NmNetwork {
    async fn current_ssid(&self) -> Option<String> {
        nmcli(&["-t", "-f", "active,ssid", "dev", "wifi"])
            .await
            .as_deref()
            .and_then(parse_active_ssid)
    }

    async fn has_wifi_transport(&self) -> bool {
        nmcli(&["-t", "-f", "TYPE,STATE", "device"])
            .await
            .map(|out| parse_wifi_connected(&out))
            .unwrap_or(false)
    }
}
