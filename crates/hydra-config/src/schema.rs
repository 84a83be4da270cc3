// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Configuration schema and defaults (§6 "Configuration").

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    5556
}

fn default_heartbeat_secs() -> f64 {
    5.0
}

fn default_t_dead_secs() -> f64 {
    30.0
}

fn default_max_peers() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration for the router runtime (C5).
///
/// Matches spec.md §6's configuration list exactly: bind address, bind port,
/// client timeout (`t_dead_secs`), heartbeat cadence, max concurrent peers,
/// and log level. No side-channel configuration file is required to run —
/// every field has a default matching spec.md's stated values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    /// `T_dead`: seconds of heartbeat silence before a peer is pruned.
    #[serde(default = "default_t_dead_secs")]
    pub t_dead_secs: f64,
    /// Heartbeat cadence advertised to peers (informational; peers choose
    /// their own sending interval, but this is echoed by `show-config`).
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: f64,
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            t_dead_secs: default_t_dead_secs(),
            heartbeat_secs: default_heartbeat_secs(),
            max_peers: default_max_peers(),
            log_level: default_log_level(),
        }
    }
}

impl RouterConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    pub fn t_dead(&self) -> Duration {
        Duration::from_secs_f64(self.t_dead_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs_f64(self.heartbeat_secs)
    }

    /// Prune cadence per §4.5: half the dead timeout.
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs_f64(self.t_dead_secs / 2.0)
    }
}

fn default_router_url() -> String {
    "ws://127.0.0.1:5556/connect".to_string()
}

fn default_request_timeout_secs() -> f64 {
    10.0
}

/// Configuration for the peer library (C6 and its connection wrapper).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    #[serde(default = "default_router_url")]
    pub router_url: String,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: f64,
    /// Default deadline for a correlation-layer request when the caller
    /// doesn't specify one explicitly.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            router_url: default_router_url(),
            heartbeat_secs: default_heartbeat_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl PeerConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs_f64(self.heartbeat_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }
}
