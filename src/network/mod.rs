// Portal Autologin - Host Network
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Host network state and HTTP portal probes.

pub mod nm;
pub mod probe;

use async_trait::async_trait;

pub use nm::NmNetwork;
pub use probe::{HttpProbe, PortalProbe, ProbeResponse};

/// Connectivity change reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A network became usable.
    Available,
    /// The capabilities of the current network changed.
    CapabilitiesChanged { wifi: bool },
    /// The network went away.
    Lost,
}

/// Queries against the host's current network.
///
/// Both calls are fallible on the host side and report failure as
/// absent / `false`.
#[async_trait]
pub trait HostNetwork: Send + Sync {
    /// Name (SSID) of the connected Wi-Fi network, if any.
    async fn current_ssid(&self) -> Option<String>;

    /// Whether the active connection uses a Wi-Fi transport.
    async fn has_wifi_transport(&self) -> bool;
}

/// SSID of the current network, only when it is carried over Wi-Fi.
pub async fn wifi_ssid(network: &dyn HostNetwork) -> Option<String> {
    if !network.has_wifi_transport().await {
        return None;
    }
    network.current_ssid().await
}
