// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Router runtime (C5, §4.5): binds the listening socket, spawns the
//! receive and prune loops, and coordinates startup/shutdown.

use std::sync::Arc;

use axum::routing::get;
use axum::Router as AxumRouter;
use tokio::net::TcpListener;
use tracing::info;

use hydra_config::RouterConfig;
use hydra_core::Registry;

use crate::connections::ConnectionTable;
use crate::error::RuntimeError;
use crate::ws::connect_handler;

/// Shared state handed to every axum handler — cheap to clone, as every
/// field is already an `Arc` (mirrors `AgentHandle`'s clone-by-reference
/// shape in the teacher's `ControlService`).
#[derive(Clone)]
pub struct RouterState {
    pub registry: Arc<Registry>,
    pub connections: Arc<ConnectionTable>,
    pub max_peers: usize,
}

/// Start the router runtime: bind, spawn the prune loop, serve until a
/// shutdown signal arrives. Bind failure is fatal (§4.5). Shutdown is
/// cooperative and idempotent: a second Ctrl-C after the first is a no-op
/// because `tokio::signal::ctrl_c` is simply awaited again by whichever
/// task is still running.
pub async fn start(config: RouterConfig) -> Result<(), RuntimeError> {
    let state = RouterState {
        registry: Arc::new(Registry::new()),
        connections: Arc::new(ConnectionTable::new()),
        max_peers: config.max_peers,
    };

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| RuntimeError::BindFailed {
            addr: addr.clone(),
            source,
        })?;
    info!(addr, "router listening");

    let prune_task = tokio::spawn(crate::prune::run(
        Arc::clone(&state.registry),
        Arc::clone(&state.connections),
        config.t_dead(),
        config.prune_interval(),
    ));

    let app = AxumRouter::new()
        .route("/connect", get(connect_handler))
        .with_state(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    prune_task.abort();
    info!("router stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
