// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Peer registry (C3, §4.3): tracks connected peers and the server slot
//! under a single async lock, mirroring `ClientRegistry` in
//! `original_source/hydra_router/router.py` (an `asyncio.Lock` guarding a
//! `Dict[str, Tuple[str, float]]`) but expressed as a `tokio::sync::Mutex`
//! over a plain `HashMap`, the way the teacher's `ControlService` owns its
//! `sessions: HashMap<Uuid, Session>`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::envelope::PeerRole;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug, Clone)]
struct PeerRecord {
    role: PeerRole,
    last_heartbeat: f64,
}

/// One entry of [`Registry::snapshot`] — the shape the `client_registry_response`
/// envelope's `data` field carries per peer, per §6.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerSnapshot {
    pub role: PeerRole,
    pub last_heartbeat: f64,
    pub is_server: bool,
}

struct Inner {
    peers: HashMap<String, PeerRecord>,
    server_id: Option<String>,
}

/// The peer registry. Cheap to clone (wraps an `Arc` internally via the
/// caller holding it behind `Arc<Registry>`); every operation is mutually
/// serialized under one lock, per §4.3.
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                peers: HashMap::new(),
                server_id: None,
            }),
        }
    }

    /// Register `identity` with `role`. Idempotent: a duplicate registration
    /// updates the role and heartbeat rather than erroring (R1). If `role`
    /// is a server role, this identity becomes the new server slot,
    /// displacing any prior occupant (S1) — last-writer-wins, observed in
    /// registration order.
    pub async fn register(&self, identity: &str, role: PeerRole) {
        let mut inner = self.inner.lock().await;
        inner.peers.insert(
            identity.to_string(),
            PeerRecord {
                role,
                last_heartbeat: now_secs(),
            },
        );
        if role.is_server() {
            if let Some(prior) = &inner.server_id {
                if prior != identity {
                    tracing::info!(prior, new = identity, "server slot displaced");
                }
            }
            inner.server_id = Some(identity.to_string());
        }
    }

    /// Update `identity`'s heartbeat timestamp. No-op if the identity is not
    /// registered (R2: heartbeat is monotone non-decreasing while present).
    pub async fn touch(&self, identity: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(record) = inner.peers.get_mut(identity) {
            record.last_heartbeat = now_secs();
        }
    }

    /// Remove `identity`. Clears the server slot if it was the occupant.
    pub async fn remove(&self, identity: &str) {
        let mut inner = self.inner.lock().await;
        if inner.peers.remove(identity).is_some() && inner.server_id.as_deref() == Some(identity) {
            inner.server_id = None;
        }
    }

    /// Remove every entry whose last heartbeat is older than `t_dead`,
    /// returning the removed identities for logging (§4.3, §4.5).
    pub async fn prune(&self, t_dead: Duration) -> Vec<String> {
        let mut inner = self.inner.lock().await;
        let cutoff = now_secs() - t_dead.as_secs_f64();
        let stale: Vec<String> = inner
            .peers
            .iter()
            .filter(|(_, record)| record.last_heartbeat < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            inner.peers.remove(id);
            if inner.server_id.as_deref() == Some(id.as_str()) {
                inner.server_id = None;
            }
        }
        stale
    }

    /// Identities with a client role, excluding `exclude_identity` — the
    /// broadcast set for a server-originated envelope (§4.3, §4.4 rule 4).
    pub async fn clients_to_broadcast(&self, exclude_identity: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .peers
            .iter()
            .filter(|(id, record)| id.as_str() != exclude_identity && record.role.is_client())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// The current forward target for client-originated traffic, if any
    /// (R4).
    pub async fn server_identity(&self) -> Option<String> {
        self.inner.lock().await.server_id.clone()
    }

    /// Whether a server is currently registered.
    pub async fn has_server(&self) -> bool {
        self.inner.lock().await.server_id.is_some()
    }

    /// Number of currently-registered peers.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.peers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The role a given identity is currently registered under, if any.
    /// Used by the dispatcher's ensure-registered rule to detect a
    /// declared-role disagreement (§4.4, §9).
    pub async fn role_of(&self, identity: &str) -> Option<PeerRole> {
        self.inner.lock().await.peers.get(identity).map(|r| r.role)
    }

    /// Whether `identity` is currently registered, regardless of role.
    pub async fn contains(&self, identity: &str) -> bool {
        self.inner.lock().await.peers.contains_key(identity)
    }

    /// A read-only snapshot of the whole registry, keyed by transport
    /// identity — the shape returned to a `client_registry_request`.
    pub async fn snapshot(&self) -> HashMap<String, PeerSnapshot> {
        let inner = self.inner.lock().await;
        inner
            .peers
            .iter()
            .map(|(id, record)| {
                (
                    id.clone(),
                    PeerSnapshot {
                        role: record.role,
                        last_heartbeat: record.last_heartbeat,
                        is_server: inner.server_id.as_deref() == Some(id.as_str()),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_is_idempotent_in_observable_state() {
        let reg = Registry::new();
        reg.register("c1", PeerRole::SimpleClient).await;
        let snap1 = reg.snapshot().await;
        reg.register("c1", PeerRole::SimpleClient).await;
        let snap2 = reg.snapshot().await;
        assert_eq!(snap1.len(), snap2.len());
        assert_eq!(snap1.get("c1").unwrap().role, snap2.get("c1").unwrap().role);
    }

    #[tokio::test]
    async fn server_displacement_is_last_writer_wins() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        assert_eq!(reg.server_identity().await.as_deref(), Some("s1"));

        reg.register("s2", PeerRole::HydraServer).await;
        assert_eq!(reg.server_identity().await.as_deref(), Some("s2"));

        // s1 remains registered, just demoted from the forward-target role.
        assert!(reg.contains("s1").await);
    }

    #[tokio::test]
    async fn remove_clears_server_slot() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        reg.remove("s1").await;
        assert_eq!(reg.server_identity().await, None);
        assert!(!reg.contains("s1").await);
    }

    #[tokio::test]
    async fn prune_removes_stale_entries_only() {
        let reg = Registry::new();
        reg.register("fresh", PeerRole::SimpleClient).await;
        reg.register("stale", PeerRole::SimpleClient).await;

        // Force "stale" to look old by pruning with a zero timeout after a
        // brief wait, then re-touch "fresh" so only "stale" is evicted.
        tokio::time::sleep(Duration::from_millis(20)).await;
        reg.touch("fresh").await;

        let removed = reg.prune(Duration::from_millis(10)).await;
        assert_eq!(removed, vec!["stale".to_string()]);
        assert!(reg.contains("fresh").await);
        assert!(!reg.contains("stale").await);
    }

    #[tokio::test]
    async fn prune_clears_server_slot_when_server_is_pruned() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = reg.prune(Duration::from_millis(10)).await;
        assert_eq!(removed, vec!["s1".to_string()]);
        assert_eq!(reg.server_identity().await, None);
    }

    #[tokio::test]
    async fn clients_to_broadcast_excludes_sender_and_servers() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        reg.register("c1", PeerRole::SimpleClient).await;
        reg.register("c2", PeerRole::HydraClient).await;

        let mut targets = reg.clients_to_broadcast("s1").await;
        targets.sort();
        assert_eq!(targets, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[tokio::test]
    async fn touch_on_unknown_identity_is_a_no_op() {
        let reg = Registry::new();
        reg.touch("ghost").await;
        assert!(!reg.contains("ghost").await);
    }
}
