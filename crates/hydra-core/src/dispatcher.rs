// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Dispatcher (C4, §4.4): turns one validated inbound envelope into zero or
//! more outbound envelopes, addressed by transport identity.
//!
//! The dispatcher touches the registry (ensure-registered rule, broadcast
//! enumeration, forward-target lookup) but never touches the transport —
//! callers (the router runtime) are responsible for actually sending the
//! envelopes this module produces.

use serde_json::{Map, Value};

use crate::envelope::{PeerRole, WireEnvelope};
use crate::registry::Registry;

/// One outbound envelope, addressed to a transport identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: String,
    pub envelope: WireEnvelope,
}

/// `elem` value for the registry-query request, per §6.
pub const CLIENT_REGISTRY_REQUEST: &str = "client_registry_request";
/// `elem` value for the registry-query response, per §6.
pub const CLIENT_REGISTRY_RESPONSE: &str = "client_registry_response";
/// `elem` value for the router-originated error envelope, per §6.
pub const ERROR: &str = "error";
/// `elem` value for heartbeats, per §6.
pub const HEARTBEAT: &str = "heartbeat";

fn router_envelope(elem: &str, data: Map<String, Value>, request_id: Option<String>) -> WireEnvelope {
    WireEnvelope {
        sender: PeerRole::HydraRouter,
        elem: elem.to_string(),
        timestamp: None,
        data: Some(data),
        client_id: None,
        request_id,
        extra: Map::new(),
    }
}

/// Dispatch one validated inbound envelope from `sender_identity`.
///
/// Implements the ensure-registered rule followed by the five ordered
/// routing rules of §4.4. Returns the (possibly empty) set of outbound
/// envelopes to send.
pub async fn dispatch(registry: &Registry, sender_identity: &str, envelope: &WireEnvelope) -> Vec<Outbound> {
    if !registry.contains(sender_identity).await {
        registry.register(sender_identity, envelope.sender).await;
    } else {
        registry.touch(sender_identity).await;
        if let Some(declared) = registry.role_of(sender_identity).await {
            if declared != envelope.sender {
                tracing::warn!(
                    identity = sender_identity,
                    registered_role = %declared,
                    declared_role = %envelope.sender,
                    "sender role disagrees with previously registered role; routing by declared role"
                );
            }
        }
    }

    // Rule 1: heartbeat is update-only, no outbound traffic.
    if envelope.elem == HEARTBEAT {
        return Vec::new();
    }

    // Rule 2: registry query.
    if envelope.elem == CLIENT_REGISTRY_REQUEST {
        let snapshot = registry.snapshot().await;
        let mut data = Map::new();
        for (identity, peer) in snapshot {
            data.insert(identity, serde_json::to_value(peer).unwrap_or(Value::Null));
        }
        let out = router_envelope(CLIENT_REGISTRY_RESPONSE, data, envelope.request_id.clone());
        return vec![Outbound {
            target: sender_identity.to_string(),
            envelope: out,
        }];
    }

    if envelope.sender.is_client() {
        // Rule 3: forward to the current server, or emit a no-server error.
        return match registry.server_identity().await {
            Some(server) => vec![Outbound {
                target: server,
                envelope: envelope.clone(),
            }],
            None => {
                let mut data = Map::new();
                data.insert("error".to_string(), Value::String("no_server_connected".to_string()));
                data.insert("original_request".to_string(), Value::String(envelope.elem.clone()));
                data.insert(
                    "message".to_string(),
                    Value::String("no server is currently connected to the router".to_string()),
                );
                let out = router_envelope(ERROR, data, envelope.request_id.clone());
                vec![Outbound {
                    target: sender_identity.to_string(),
                    envelope: out,
                }]
            }
        };
    }

    if envelope.sender.is_server() {
        // Rule 4: broadcast to every other registered client.
        let targets = registry.clients_to_broadcast(sender_identity).await;
        return targets
            .into_iter()
            .map(|target| Outbound {
                target,
                envelope: envelope.clone(),
            })
            .collect();
    }

    // Rule 5: anything else (i.e. sender = HydraRouter) is discarded.
    tracing::warn!(sender = %envelope.sender, elem = %envelope.elem, "discarding envelope from non-peer sender");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::PeerRole;
    use serde_json::json;

    fn envelope(sender: PeerRole, elem: &str) -> WireEnvelope {
        WireEnvelope {
            sender,
            elem: elem.to_string(),
            timestamp: None,
            data: None,
            client_id: None,
            request_id: Some("r1".to_string()),
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn heartbeat_produces_no_outbound_and_touches_registry() {
        let reg = Registry::new();
        let env = envelope(PeerRole::SimpleClient, HEARTBEAT);
        let out = dispatch(&reg, "c1", &env).await;
        assert!(out.is_empty());
        assert!(reg.contains("c1").await);
    }

    #[tokio::test]
    async fn client_request_forwards_to_server_when_present() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::SimpleServer).await;
        let env = envelope(PeerRole::SimpleClient, "square_request");
        let out = dispatch(&reg, "c1", &env).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, "s1");
        assert_eq!(out[0].envelope.elem, "square_request");
        assert_eq!(out[0].envelope.request_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn client_request_without_server_yields_no_server_error() {
        let reg = Registry::new();
        let env = envelope(PeerRole::SimpleClient, "square_request");
        let out = dispatch(&reg, "c1", &env).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, "c1");
        assert_eq!(out[0].envelope.sender, PeerRole::HydraRouter);
        assert_eq!(out[0].envelope.elem, ERROR);
        assert_eq!(
            out[0].envelope.data.as_ref().unwrap().get("error"),
            Some(&json!("no_server_connected"))
        );
        assert_eq!(out[0].envelope.request_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn server_broadcast_reaches_every_other_client() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        reg.register("c1", PeerRole::SimpleClient).await;
        reg.register("c2", PeerRole::HydraClient).await;
        let env = envelope(PeerRole::HydraServer, "status_update");
        let mut out = dispatch(&reg, "s1", &env).await;
        out.sort_by(|a, b| a.target.cmp(&b.target));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].target, "c1");
        assert_eq!(out[1].target, "c2");
    }

    #[tokio::test]
    async fn server_broadcast_with_no_clients_emits_nothing() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        let env = envelope(PeerRole::HydraServer, "status_update");
        let out = dispatch(&reg, "s1", &env).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn registry_query_replies_to_sender_with_snapshot() {
        let reg = Registry::new();
        reg.register("s1", PeerRole::HydraServer).await;
        let env = envelope(PeerRole::SimpleClient, CLIENT_REGISTRY_REQUEST);
        let out = dispatch(&reg, "c1", &env).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, "c1");
        assert_eq!(out[0].envelope.elem, CLIENT_REGISTRY_RESPONSE);
        let data = out[0].envelope.data.as_ref().unwrap();
        assert!(data.contains_key("s1"));
        assert!(data.contains_key("c1"));
    }

    #[tokio::test]
    async fn router_sender_is_discarded() {
        let reg = Registry::new();
        let env = envelope(PeerRole::HydraRouter, "status_update");
        let out = dispatch(&reg, "r1", &env).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn ensure_registered_registers_unknown_sender_by_declared_role() {
        let reg = Registry::new();
        let env = envelope(PeerRole::HydraServer, HEARTBEAT);
        dispatch(&reg, "s1", &env).await;
        assert_eq!(reg.role_of("s1").await, Some(PeerRole::HydraServer));
    }
}
