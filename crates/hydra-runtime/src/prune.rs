// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Prune loop (§4.5): ticks every `T_dead / 2`, evicting registry entries
//! whose heartbeat has gone stale and closing their connection-table slot so
//! a later reconnect under the same identity isn't blocked by a ghost entry.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use hydra_core::Registry;

use crate::connections::ConnectionTable;

pub async fn run(registry: Arc<Registry>, connections: Arc<ConnectionTable>, t_dead: Duration, cadence: Duration) {
    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = registry.prune(t_dead).await;
                if !removed.is_empty() {
                    info!(count = removed.len(), ids = ?removed, "pruned stale peers");
                }
                for id in &removed {
                    connections.remove(id).await;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}
