// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! WebSocket transport (§6): one axum route, `GET /connect`, upgraded per
//! peer. The transport identity is the peer-chosen `identity` query
//! parameter — ZeroMQ's `ROUTER` socket supplies this automatically via
//! `zmq.IDENTITY`; a WebSocket upgrade does not, so the handshake is read
//! for it instead (§9's resolved transport question).
//!
//! Grounded on `sven-node`'s `http/ws.rs::ws_handler`/`handle_socket` shape:
//! upgrade, then a `tokio::select!` loop bridging the socket to the rest of
//! the system. HydraRouter splits the socket (`StreamExt::split`) instead of
//! selecting on the same handle, because each connection also needs its own
//! outbound queue fed by the dispatcher (`ConnectionTable`), not just a
//! shared broadcast stream.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use hydra_core::validator::{self};

use crate::router::RouterState;

/// HTTP handler for `GET /connect`.
///
/// A request with no `identity` query parameter is rejected at the HTTP
/// layer (400) before a socket is ever handed to the receive loop, per §6.
pub async fn connect_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<RouterState>,
) -> Response {
    let identity = match params.get("identity") {
        Some(id) if !id.is_empty() => id.clone(),
        _ => {
            return (StatusCode::BAD_REQUEST, "missing `identity` query parameter").into_response();
        }
    };

    if state.registry.len().await >= state.max_peers {
        return (StatusCode::TOO_MANY_REQUESTS, "router is at max_peers capacity").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

async fn handle_socket(socket: WebSocket, identity: String, state: RouterState) {
    info!(identity, "peer connected");
    let (mut sink, mut stream) = socket.split();

    let mut outbound = state.connections.register(&identity).await;
    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound.recv().await {
            let text = envelope.to_json().to_string();
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_inbound(&state, &identity, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary/ping/pong frames carry no envelope semantics here
            Err(e) => {
                debug!(identity, "WebSocket recv error: {e}");
                break;
            }
        }
    }

    writer.abort();
    state.connections.remove(&identity).await;
    state.registry.remove(&identity).await;
    info!(identity, "peer disconnected");
}

/// Parse, validate, and dispatch one inbound text frame.
///
/// Unparseable bytes are logged and dropped without registering the sender
/// (§4.4's edge case: `sender` could not even be determined). A validation
/// failure is logged with its structured diagnostic and likewise dropped.
async fn handle_inbound(state: &RouterState, identity: &str, text: &str) {
    let raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            let err = hydra_core::ParseError {
                truncated_payload: text.chars().take(200).collect(),
                source: e,
            };
            warn!(identity, error = %err.source, payload = %err.truncated_payload, "dropping unparseable envelope");
            return;
        }
    };

    let envelope = match validator::validate(&raw) {
        Ok(env) => env,
        Err(e) => {
            let diag = e.diagnostic();
            warn!(
                identity,
                field = %diag.field,
                expected = %diag.expected,
                actual = %diag.actual,
                hint = %diag.hint,
                "dropping invalid envelope"
            );
            return;
        }
    };

    let outbound = hydra_core::dispatch(&state.registry, identity, &envelope).await;
    for out in outbound {
        state.connections.send_to(&out.target, out.envelope).await;
    }
}
