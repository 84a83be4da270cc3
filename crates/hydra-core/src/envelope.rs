// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Wire and application envelope types, plus the peer-role and envelope-kind
//! enumerations that the validator and adapter are built around.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of peer roles a sender may declare.
///
/// `HydraRouter` never appears as the `sender` of an inbound envelope — it is
/// reserved for envelopes the router itself originates (registry responses,
/// errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerRole {
    HydraClient,
    HydraServer,
    SimpleClient,
    SimpleServer,
    HydraRouter,
}

impl PeerRole {
    pub const ALL: [PeerRole; 5] = [
        PeerRole::HydraClient,
        PeerRole::HydraServer,
        PeerRole::SimpleClient,
        PeerRole::SimpleServer,
        PeerRole::HydraRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeerRole::HydraClient => "HydraClient",
            PeerRole::HydraServer => "HydraServer",
            PeerRole::SimpleClient => "SimpleClient",
            PeerRole::SimpleServer => "SimpleServer",
            PeerRole::HydraRouter => "HydraRouter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Whether this role is a *client* role for routing purposes: a
    /// broadcast target, never a forward target.
    pub fn is_client(&self) -> bool {
        matches!(self, PeerRole::HydraClient | PeerRole::SimpleClient)
    }

    /// Whether this role is a *server* role: the forward target for
    /// client-originated traffic, and the source of broadcasts.
    pub fn is_server(&self) -> bool {
        matches!(self, PeerRole::HydraServer | PeerRole::SimpleServer)
    }
}

impl std::fmt::Display for PeerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed enumeration of application-level envelope kinds (§6).
///
/// The adapter performs a total, bijective mapping between this enum and the
/// wire `elem` string; an `elem` outside this set fails conversion rather
/// than being coerced into a generic variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Heartbeat,
    SquareRequest,
    SquareResponse,
    ClientRegistryRequest,
    ClientRegistryResponse,
    StartSimulation,
    StopSimulation,
    PauseSimulation,
    ResumeSimulation,
    ResetSimulation,
    GetSimulationStatus,
    StatusUpdate,
    SimulationStarted,
    SimulationStopped,
    SimulationPaused,
    SimulationResumed,
    SimulationReset,
    Error,
}

impl EnvelopeKind {
    pub const ALL: [EnvelopeKind; 18] = [
        EnvelopeKind::Heartbeat,
        EnvelopeKind::SquareRequest,
        EnvelopeKind::SquareResponse,
        EnvelopeKind::ClientRegistryRequest,
        EnvelopeKind::ClientRegistryResponse,
        EnvelopeKind::StartSimulation,
        EnvelopeKind::StopSimulation,
        EnvelopeKind::PauseSimulation,
        EnvelopeKind::ResumeSimulation,
        EnvelopeKind::ResetSimulation,
        EnvelopeKind::GetSimulationStatus,
        EnvelopeKind::StatusUpdate,
        EnvelopeKind::SimulationStarted,
        EnvelopeKind::SimulationStopped,
        EnvelopeKind::SimulationPaused,
        EnvelopeKind::SimulationResumed,
        EnvelopeKind::SimulationReset,
        EnvelopeKind::Error,
    ];

    /// The canonical wire-format `elem` string for this kind.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Heartbeat => "heartbeat",
            EnvelopeKind::SquareRequest => "square_request",
            EnvelopeKind::SquareResponse => "square_response",
            EnvelopeKind::ClientRegistryRequest => "client_registry_request",
            EnvelopeKind::ClientRegistryResponse => "client_registry_response",
            EnvelopeKind::StartSimulation => "start_simulation",
            EnvelopeKind::StopSimulation => "stop_simulation",
            EnvelopeKind::PauseSimulation => "pause_simulation",
            EnvelopeKind::ResumeSimulation => "resume_simulation",
            EnvelopeKind::ResetSimulation => "reset_simulation",
            EnvelopeKind::GetSimulationStatus => "get_simulation_status",
            EnvelopeKind::StatusUpdate => "status_update",
            EnvelopeKind::SimulationStarted => "simulation_started",
            EnvelopeKind::SimulationStopped => "simulation_stopped",
            EnvelopeKind::SimulationPaused => "simulation_paused",
            EnvelopeKind::SimulationResumed => "simulation_resumed",
            EnvelopeKind::SimulationReset => "simulation_reset",
            EnvelopeKind::Error => "error",
        }
    }

    /// Parse a wire `elem` string into its application-level kind.
    ///
    /// Returns `None` for any string outside the closed set — callers
    /// surface this as a conversion error rather than inventing a variant.
    pub fn from_wire_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_wire_str() == s)
    }
}

/// A validated wire envelope: the JSON object actually sent or received on
/// the socket, per §3/§6.
///
/// `extra` preserves any additional keys the sender included beyond the
/// schema — they are carried through unchanged on pass-through but never
/// interpreted, per §4.1's forward-compatibility note.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEnvelope {
    pub sender: PeerRole,
    pub elem: String,
    pub timestamp: Option<f64>,
    pub data: Option<Map<String, Value>>,
    pub client_id: Option<String>,
    pub request_id: Option<String>,
    pub extra: Map<String, Value>,
}

impl WireEnvelope {
    /// Serialize back to the JSON object form used on the wire. Absent
    /// optional fields are omitted, never written as explicit `null`.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("sender".to_string(), Value::String(self.sender.as_str().to_string()));
        obj.insert("elem".to_string(), Value::String(self.elem.clone()));
        if let Some(ts) = self.timestamp {
            obj.insert("timestamp".to_string(), serde_json::json!(ts));
        }
        if let Some(data) = &self.data {
            obj.insert("data".to_string(), Value::Object(data.clone()));
        }
        if let Some(cid) = &self.client_id {
            obj.insert("client_id".to_string(), Value::String(cid.clone()));
        }
        if let Some(rid) = &self.request_id {
            obj.insert("request_id".to_string(), Value::String(rid.clone()));
        }
        for (k, v) in &self.extra {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }
}

/// The internal, typed message shape used by peer libraries (§3).
///
/// `kind` is drawn from the closed [`EnvelopeKind`] enumeration rather than a
/// free-form string — the adapter is the only place a wire `elem` string is
/// parsed into (or rendered from) this type.
#[derive(Debug, Clone, PartialEq)]
pub struct AppEnvelope {
    pub sender: PeerRole,
    pub kind: EnvelopeKind,
    pub timestamp: Option<f64>,
    pub data: Option<Map<String, Value>>,
    pub client_id: Option<String>,
    pub request_id: Option<String>,
}

impl AppEnvelope {
    pub fn new(sender: PeerRole, kind: EnvelopeKind) -> Self {
        Self {
            sender,
            kind,
            timestamp: None,
            data: None,
            client_id: None,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
