// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Config file discovery, merge, and environment-variable overrides.
//!
//! Grounded on `sven-config::loader`'s `config_search_paths` / `merge_yaml`
//! shape, reworked for the smaller `RouterConfig`/`PeerConfig` schema and
//! extended with an environment-variable override layer (`sven-config`
//! layers env vars inside each provider's driver instead; HydraRouter has
//! no such per-field driver layer, so the override is applied once here).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::schema::{PeerConfig, RouterConfig};

fn config_search_paths(file_stem: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("/etc/hydra-router/{file_stem}.yaml")));

    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("hydra-router").join(format!("{file_stem}.yaml")));
    }

    paths.push(PathBuf::from(format!("{file_stem}.yaml")));
    paths.push(PathBuf::from(format!("{file_stem}.yml")));

    paths
}

fn merge_yaml(dst: &mut serde_yaml::Value, src: serde_yaml::Value) {
    match (dst, src) {
        (serde_yaml::Value::Mapping(d), serde_yaml::Value::Mapping(s)) => {
            for (k, v) in s {
                let entry = d
                    .entry(k)
                    .or_insert(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
                merge_yaml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

fn load_layers(file_stem: &str, extra: Option<&Path>) -> anyhow::Result<serde_yaml::Value> {
    let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());

    for path in config_search_paths(file_stem) {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let layer: serde_yaml::Value = serde_yaml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            merge_yaml(&mut merged, layer);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
        let layer: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", p.display()))?;
        merge_yaml(&mut merged, layer);
    }

    Ok(merged)
}

fn apply_env_override(merged: &mut serde_yaml::Value, env_var: &str, field: &str) {
    if let Ok(value) = std::env::var(env_var) {
        let parsed: serde_yaml::Value =
            serde_yaml::from_str(&value).unwrap_or(serde_yaml::Value::String(value));
        if let serde_yaml::Value::Mapping(m) = merged {
            m.insert(serde_yaml::Value::String(field.to_string()), parsed);
        }
    }
}

fn deserialize_or_default<T: DeserializeOwned + Default>(merged: serde_yaml::Value) -> T {
    if matches!(merged, serde_yaml::Value::Mapping(ref m) if m.is_empty()) {
        T::default()
    } else {
        serde_yaml::from_value(merged).unwrap_or_default()
    }
}

/// Load the router configuration, merging (lowest to highest priority)
/// built-in defaults, discovered YAML files, an explicit `--config` path,
/// and `HYDRA_ROUTER_*` environment variable overrides.
pub fn load(extra: Option<&Path>) -> anyhow::Result<RouterConfig> {
    let mut merged = load_layers("router", extra)?;

    apply_env_override(&mut merged, "HYDRA_ROUTER_BIND_HOST", "bind_host");
    apply_env_override(&mut merged, "HYDRA_ROUTER_BIND_PORT", "bind_port");
    apply_env_override(&mut merged, "HYDRA_ROUTER_T_DEAD_SECS", "t_dead_secs");
    apply_env_override(&mut merged, "HYDRA_ROUTER_HEARTBEAT_SECS", "heartbeat_secs");
    apply_env_override(&mut merged, "HYDRA_ROUTER_MAX_PEERS", "max_peers");
    apply_env_override(&mut merged, "HYDRA_ROUTER_LOG_LEVEL", "log_level");

    Ok(deserialize_or_default(merged))
}

/// Load the peer library configuration, following the same layering as
/// [`load`] but for `PeerConfig` and `HYDRA_PEER_*` variables.
pub fn load_peer(extra: Option<&Path>) -> anyhow::Result<PeerConfig> {
    let mut merged = load_layers("peer", extra)?;

    apply_env_override(&mut merged, "HYDRA_PEER_ROUTER_URL", "router_url");
    apply_env_override(&mut merged, "HYDRA_PEER_HEARTBEAT_SECS", "heartbeat_secs");
    apply_env_override(
        &mut merged,
        "HYDRA_PEER_REQUEST_TIMEOUT_SECS",
        "request_timeout_secs",
    );
    apply_env_override(&mut merged, "HYDRA_PEER_LOG_LEVEL", "log_level");

    Ok(deserialize_or_default(merged))
}
