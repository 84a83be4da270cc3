// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Outbound connection table: transport identity → a bounded channel feeding
//! that peer's WebSocket send task.
//!
//! This is the runtime's half of the dispatcher's back-pressure contract
//! (§5): a full or closed channel is a skip-and-log, never a block on the
//! receive loop, matching the teacher's `ControlService::broadcast`
//! (`let _ = self.event_tx.send(ev);`) philosophy of tolerating a slow or
//! gone receiver rather than stalling the sender.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::warn;

use hydra_core::WireEnvelope;

/// Outbound queue depth per connected peer. Generous enough to absorb a
/// burst of broadcasts without dropping; a peer that stays behind this
/// depth is effectively wedged and will be pruned on heartbeat timeout.
const PER_PEER_QUEUE_DEPTH: usize = 128;

#[derive(Default)]
pub struct ConnectionTable {
    senders: RwLock<HashMap<String, mpsc::Sender<WireEnvelope>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the sender half of a new connection's outbound channel and
    /// return the receiver half for the connection's writer task.
    pub async fn register(&self, identity: &str) -> mpsc::Receiver<WireEnvelope> {
        let (tx, rx) = mpsc::channel(PER_PEER_QUEUE_DEPTH);
        self.senders.write().await.insert(identity.to_string(), tx);
        rx
    }

    pub async fn remove(&self, identity: &str) {
        self.senders.write().await.remove(identity);
    }

    /// Enqueue `envelope` for delivery to `target`. Skip-and-log on any
    /// failure: unknown target, full queue (transient send-unready), or a
    /// channel whose receiver has already dropped (closed peer) — per §4.4's
    /// edge-case note and §5's back-pressure clause.
    pub async fn send_to(&self, target: &str, envelope: WireEnvelope) {
        let senders = self.senders.read().await;
        let Some(tx) = senders.get(target) else {
            warn!(target, "dropping outbound envelope: target not connected");
            return;
        };
        match tx.try_send(envelope) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(target, "dropping outbound envelope: send queue full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(target, "dropping outbound envelope: peer connection closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_core::{EnvelopeKind, PeerRole};

    fn env() -> WireEnvelope {
        hydra_core::to_wire(
            &hydra_core::AppEnvelope::new(PeerRole::SimpleServer, EnvelopeKind::Heartbeat),
            PeerRole::SimpleServer,
            None,
        )
    }

    #[tokio::test]
    async fn send_to_unknown_target_is_a_noop() {
        let table = ConnectionTable::new();
        table.send_to("ghost", env()).await;
    }

    #[tokio::test]
    async fn registered_target_receives_envelope() {
        let table = ConnectionTable::new();
        let mut rx = table.register("c1").await;
        table.send_to("c1", env()).await;
        let received = rx.recv().await.unwrap();
        assert_eq!(received.elem, "heartbeat");
    }

    #[tokio::test]
    async fn removed_target_drops_subsequent_sends() {
        let table = ConnectionTable::new();
        let _rx = table.register("c1").await;
        table.remove("c1").await;
        table.send_to("c1", env()).await;
    }

    #[tokio::test]
    async fn full_queue_is_skipped_not_blocking() {
        let table = ConnectionTable::new();
        let _rx = table.register("c1").await;
        for _ in 0..PER_PEER_QUEUE_DEPTH + 10 {
            table.send_to("c1", env()).await;
        }
    }
}
