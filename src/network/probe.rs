// Portal Autologin - Portal Probe
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! HTTP requests against a profile's trigger URL.
//!
//! The same request serves two purposes: poking the network so the portal
//! intercepts it, and checking later whether the portal is still in the way.

use async_trait::async_trait;
use reqwest::{redirect, Url};
use tracing::debug;

use crate::models::{Error, NetworkConfig, Result};
use crate::{APP_NAME, VERSION};

/// What a probe request came back with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// URL the response was served from.
    pub url: String,
}

impl ProbeResponse {
    /// Whether this response means a portal still stands between us and
    /// `requested`: a redirect status, or a response served from elsewhere.
    pub fn indicates_portal(&self, requested: &str) -> bool {
        (300..400).contains(&self.status) || !same_url(&self.url, requested)
    }
}

/// Compare two URLs after parsing, so `http://host` equals `http://host/`.
pub fn same_url(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Issues GET requests without following redirects.
#[async_trait]
pub trait PortalProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeResponse>;
}

/// reqwest-backed probe with fixed connect and total timeouts.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(config.probe_connect_timeout())
            .timeout(config.probe_connect_timeout() + config.probe_read_timeout())
            .user_agent(format!("{}/{}", APP_NAME, VERSION))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PortalProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<ProbeResponse> {
        let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;
        let response = self.client.get(parsed).send().await?;
        let result = ProbeResponse {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        };
        debug!("Probe {} -> {}", url, result.status);
        Ok(result)
    }
}
