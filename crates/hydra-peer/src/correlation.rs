// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Correlation layer (C6, §4.6): associates a `request_id` with a waiting
//! completion slot, delivers the matching reply, and enforces a per-request
//! timeout.
//!
//! Grounded on `sven-p2p::node`'s `pending_outbound: HashMap<OutboundRequestId,
//! oneshot::Sender<Result<TaskResponse, P2pError>>>` — a request registers a
//! oneshot before sending, the receive loop fires it by id when the reply
//! arrives, and the sender applies its own timeout around the receiver
//! (`send_task`'s doc comment: "The caller is responsible for applying its
//! own timeout"). HydraRouter's table applies the timeout itself so every
//! caller gets the same deadline behavior for free.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, Mutex};

use hydra_core::AppEnvelope;

use crate::error::PeerError;

struct Inner {
    slots: HashMap<String, oneshot::Sender<AppEnvelope>>,
}

/// A table of in-flight requests awaiting their reply, keyed by
/// `request_id`. Single-shot semantics are enforced by `oneshot`: a second
/// [`CorrelationTable::complete`] call for the same id finds no slot and is
/// a no-op, satisfying "duplicate replies after completion are discarded."
pub struct CorrelationTable {
    inner: Mutex<Inner>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { slots: HashMap::new() }),
        }
    }

    /// Register a completion slot for `request_id`, send the request via
    /// `send`, then await the reply up to `deadline`. On timeout the slot is
    /// removed atomically so a late duplicate reply cannot resurrect it.
    pub async fn request<F, Fut>(
        &self,
        request_id: String,
        operation: &str,
        deadline: Duration,
        send: F,
    ) -> Result<AppEnvelope, PeerError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), PeerError>>,
    {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().await.slots.insert(request_id.clone(), tx);

        if let Err(e) = send().await {
            self.inner.lock().await.slots.remove(&request_id);
            return Err(e);
        }

        let started = Instant::now();
        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_canceled)) => Err(PeerError::Shutdown),
            Err(_elapsed) => {
                self.inner.lock().await.slots.remove(&request_id);
                Err(PeerError::Timeout {
                    operation: operation.to_string(),
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    /// Attempt to complete the slot for `request_id` with `envelope`.
    /// Returns `true` if a pending slot was found and completed, `false` if
    /// there was none (unsolicited reply, already completed, or already
    /// timed out) — the caller should fall through to the kind-handler path
    /// on `false`, per §4.6.
    pub async fn complete(&self, request_id: &str, envelope: AppEnvelope) -> bool {
        let tx = self.inner.lock().await.slots.remove(request_id);
        match tx {
            Some(tx) => tx.send(envelope).is_ok(),
            None => false,
        }
    }

    /// Cancel every outstanding slot (graceful shutdown, §4.6): dropping the
    /// `oneshot::Sender`s fires each awaiting `rx` with a canceled error,
    /// which `request` maps to [`PeerError::Shutdown`].
    pub async fn cancel_all(&self) {
        self.inner.lock().await.slots.clear();
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_core::{EnvelopeKind, PeerRole};

    fn reply(request_id: &str) -> AppEnvelope {
        AppEnvelope::new(PeerRole::SimpleServer, EnvelopeKind::SquareResponse)
            .with_request_id(request_id)
    }

    #[tokio::test]
    async fn request_completes_on_matching_reply() {
        let table = CorrelationTable::new();
        let reply_env = reply("r1");

        let table_ref = &table;
        let send_and_reply = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            table_ref.complete("r1", reply_env.clone()).await;
        };

        let (result, _) = tokio::join!(
            table.request("r1".to_string(), "square_request", Duration::from_secs(1), || async {
                Ok(())
            }),
            send_and_reply,
        );

        assert_eq!(result.unwrap(), reply_env);
    }

    #[tokio::test]
    async fn request_times_out_and_removes_slot() {
        let table = CorrelationTable::new();
        let result = table
            .request("r2".to_string(), "square_request", Duration::from_millis(20), || async {
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(PeerError::Timeout { .. })));
        assert_eq!(table.pending_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_reply_after_completion_is_discarded() {
        let table = CorrelationTable::new();
        assert!(table.complete("ghost", reply("ghost")).await == false);
    }

    #[tokio::test]
    async fn late_reply_after_timeout_is_a_noop() {
        let table = CorrelationTable::new();
        let result = table
            .request("r3".to_string(), "op", Duration::from_millis(10), || async { Ok(()) })
            .await;
        assert!(result.is_err());

        // The slot is already gone; a late reply finds nothing to complete.
        let delivered = table.complete("r3", reply("r3")).await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn send_failure_removes_slot_without_waiting() {
        let table = CorrelationTable::new();
        let result = table
            .request("r4".to_string(), "op", Duration::from_secs(5), || async {
                Err(PeerError::Transport("closed".to_string()))
            })
            .await;
        assert!(matches!(result, Err(PeerError::Transport(_))));
        assert_eq!(table.pending_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_all_fires_pending_slots_as_shutdown() {
        let table = std::sync::Arc::new(CorrelationTable::new());
        let t2 = table.clone();
        let handle = tokio::spawn(async move {
            t2.request("r5".to_string(), "op", Duration::from_secs(5), || async { Ok(()) })
                .await
        });

        // Give the request a moment to register its slot.
        tokio::time::sleep(Duration::from_millis(20)).await;
        table.cancel_all().await;

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(PeerError::Shutdown)));
    }
}
