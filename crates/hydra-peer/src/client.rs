// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Thin peer connect/send/receive wrapper (§1: out of scope beyond its
//! correlation machinery; specified here only at its interface with the
//! core). Grounded on `sven-node::node::exec_task`'s connect/send/receive
//! shape, generalized from a one-shot task submission into a long-lived
//! client that multiplexes heartbeats, fire-and-forget sends, and
//! correlated requests over one socket.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use uuid::Uuid;

use hydra_config::PeerConfig;
use hydra_core::{AppEnvelope, EnvelopeKind, PeerRole};

use crate::correlation::CorrelationTable;
use crate::error::PeerError;

/// An inbound envelope that didn't match a pending correlation slot —
/// delivered to the kind-handler path per §4.6.
pub type UnsolicitedReceiver = mpsc::Receiver<AppEnvelope>;

type WsSink = futures::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

struct Inner {
    role: PeerRole,
    identity: String,
    sink: Mutex<WsSink>,
}

impl Inner {
    async fn send_app(&self, app: &AppEnvelope) -> Result<(), PeerError> {
        let wire = hydra_core::to_wire(app, self.role, Some(&self.identity));
        let text = wire.to_json().to_string();
        self.sink
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}

/// A connected peer: owns the socket's write half and the correlation
/// table; the read half and heartbeat ticker run in spawned background
/// tasks sharing the same [`Inner`].
pub struct PeerClient {
    inner: Arc<Inner>,
    correlations: Arc<CorrelationTable>,
    reader_task: tokio::task::JoinHandle<()>,
    heartbeat_task: tokio::task::JoinHandle<()>,
}

impl PeerClient {
    /// Connect to `router_url` (the router's `/connect` endpoint, identity
    /// appended as a query parameter), register as `role`, and start the
    /// heartbeat ticker. An initial heartbeat is sent immediately on connect
    /// rather than waiting for the first interval tick — a supplemented
    /// feature carried over from `original_source/hydra_router/mq_client.py`'s
    /// `_heartbeat_loop`.
    pub async fn connect(
        router_url: &str,
        identity: impl Into<String>,
        role: PeerRole,
        heartbeat_interval: Duration,
    ) -> Result<(Self, UnsolicitedReceiver), PeerError> {
        let identity = identity.into();
        let url = format!(
            "{router_url}{sep}identity={identity}",
            sep = if router_url.contains('?') { "&" } else { "?" },
        );

        let (stream, _response) = connect_async(&url)
            .await
            .map_err(|e| PeerError::Transport(format!("connect to {router_url}: {e}")))?;
        let (sink, mut stream_rx) = stream.split();

        let inner = Arc::new(Inner {
            role,
            identity,
            sink: Mutex::new(sink),
        });
        let correlations = Arc::new(CorrelationTable::new());
        let (unsolicited_tx, unsolicited_rx) = mpsc::channel(128);

        let reader_correlations = Arc::clone(&correlations);
        let reader_task = tokio::spawn(async move {
            while let Some(msg) = stream_rx.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        handle_inbound_text(&text, &reader_correlations, &unsolicited_tx).await;
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("WebSocket recv error: {e}");
                        break;
                    }
                }
            }
            reader_correlations.cancel_all().await;
        });

        let heartbeat_inner = Arc::clone(&inner);
        let heartbeat_task = tokio::spawn(async move {
            send_heartbeat(&heartbeat_inner).await;
            let mut ticker = tokio::time::interval(heartbeat_interval);
            ticker.tick().await; // consume the immediate first tick
            loop {
                ticker.tick().await;
                send_heartbeat(&heartbeat_inner).await;
            }
        });

        Ok((
            Self {
                inner,
                correlations,
                reader_task,
                heartbeat_task,
            },
            unsolicited_rx,
        ))
    }

    /// Connect using a loaded [`PeerConfig`] for the router URL and
    /// heartbeat cadence, rather than passing them individually.
    pub async fn connect_with_config(
        config: &PeerConfig,
        identity: impl Into<String>,
        role: PeerRole,
    ) -> Result<(Self, UnsolicitedReceiver), PeerError> {
        Self::connect(&config.router_url, identity, role, config.heartbeat_interval()).await
    }

    /// Send an envelope with no reply expected (e.g. a server's broadcast,
    /// or a fire-and-forget notification).
    pub async fn send(&self, app: AppEnvelope) -> Result<(), PeerError> {
        self.inner.send_app(&app).await
    }

    /// Send a request carrying a fresh `request_id` and await the matching
    /// reply up to `deadline` (C6's full request lifecycle).
    pub async fn request(
        &self,
        kind: EnvelopeKind,
        data: Option<serde_json::Map<String, serde_json::Value>>,
        deadline: Duration,
    ) -> Result<AppEnvelope, PeerError> {
        let request_id = Uuid::new_v4().to_string();
        let mut app = AppEnvelope::new(self.inner.role, kind).with_request_id(request_id.clone());
        if let Some(data) = data {
            app = app.with_data(data);
        }

        let inner = Arc::clone(&self.inner);
        let operation = kind.as_wire_str().to_string();

        self.correlations
            .request(request_id, &operation, deadline, move || async move {
                inner.send_app(&app).await
            })
            .await
    }

    /// Like [`PeerClient::request`], but falls back to `config`'s
    /// `request_timeout_secs` when the caller has no deadline of its own.
    pub async fn request_with_config(
        &self,
        config: &PeerConfig,
        kind: EnvelopeKind,
        data: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<AppEnvelope, PeerError> {
        self.request(kind, data, config.request_timeout()).await
    }

    /// Cooperative shutdown (§4.6): cancel outstanding correlation slots and
    /// stop the reader/heartbeat tasks.
    pub async fn shutdown(self) {
        self.correlations.cancel_all().await;
        self.reader_task.abort();
        self.heartbeat_task.abort();
        let _ = self.inner.sink.lock().await.close().await;
    }
}

async fn send_heartbeat(inner: &Inner) {
    let app = AppEnvelope::new(inner.role, EnvelopeKind::Heartbeat);
    if let Err(e) = inner.send_app(&app).await {
        warn!(identity = %inner.identity, "heartbeat send failed: {e}");
    }
}

async fn handle_inbound_text(
    text: &str,
    correlations: &CorrelationTable,
    unsolicited_tx: &mpsc::Sender<AppEnvelope>,
) {
    let raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            let err = hydra_core::ParseError {
                truncated_payload: text.chars().take(200).collect(),
                source: e,
            };
            warn!(error = %err.source, payload = %err.truncated_payload, "dropping unparseable inbound frame");
            return;
        }
    };

    let wire = match hydra_core::validate(&raw) {
        Ok(w) => w,
        Err(e) => {
            warn!("dropping invalid inbound envelope: {e}");
            return;
        }
    };

    let app = match hydra_core::from_wire(&wire) {
        Ok(a) => a,
        Err(e) => {
            warn!("dropping unconvertible inbound envelope: {e}");
            return;
        }
    };

    if let Some(request_id) = &app.request_id {
        if correlations.complete(request_id, app.clone()).await {
            return;
        }
    }

    if unsolicited_tx.send(app).await.is_err() {
        debug!("unsolicited envelope receiver dropped; discarding");
    }
}
