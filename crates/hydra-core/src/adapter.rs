// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Envelope adapter (C2, §4.2): a total, symmetric mapping between the
//! application envelope peer libraries work with and the wire envelope the
//! router and transport work with.

use crate::envelope::{AppEnvelope, PeerRole, WireEnvelope};
use crate::error::ConversionError;

/// Convert an application envelope into its wire form.
///
/// `self_role` becomes the wire `sender` (the application envelope's own
/// `sender` field is not consulted — callers always know their own role).
/// `self_identity_hint` fills `client_id` when the application envelope
/// didn't set one explicitly; if neither is present, `client_id` is omitted
/// rather than serialized as `null`.
pub fn to_wire(app: &AppEnvelope, self_role: PeerRole, self_identity_hint: Option<&str>) -> WireEnvelope {
    let client_id = app
        .client_id
        .clone()
        .or_else(|| self_identity_hint.map(str::to_string));

    WireEnvelope {
        sender: self_role,
        elem: app.kind.as_wire_str().to_string(),
        timestamp: app.timestamp,
        data: app.data.clone(),
        client_id,
        request_id: app.request_id.clone(),
        extra: Default::default(),
    }
}

/// Convert a wire envelope into its application form.
///
/// Fails if `elem` is outside the closed [`crate::envelope::EnvelopeKind`]
/// enumeration — the adapter never fabricates a generic kind for an
/// unrecognized `elem`; the caller must handle the conversion error
/// explicitly (§4.2, §7).
pub fn from_wire(wire: &WireEnvelope) -> Result<AppEnvelope, ConversionError> {
    let kind = crate::envelope::EnvelopeKind::from_wire_str(&wire.elem).ok_or_else(|| ConversionError {
        elem: wire.elem.clone(),
    })?;

    Ok(AppEnvelope {
        sender: wire.sender,
        kind,
        timestamp: wire.timestamp,
        data: wire.data.clone(),
        client_id: wire.client_id.clone(),
        request_id: wire.request_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeKind;
    use serde_json::json;

    #[test]
    fn round_trip_every_kind() {
        for kind in EnvelopeKind::ALL {
            let app = AppEnvelope::new(PeerRole::SimpleClient, kind)
                .with_request_id("r1")
                .with_timestamp(123.5)
                .with_data(json!({"k": "v"}).as_object().unwrap().clone());

            let wire = to_wire(&app, PeerRole::SimpleClient, None);
            let back = from_wire(&wire).unwrap();
            assert_eq!(back, app, "round trip failed for {kind:?}");
        }
    }

    #[test]
    fn to_wire_uses_self_role_not_app_sender() {
        let app = AppEnvelope::new(PeerRole::HydraClient, EnvelopeKind::Heartbeat);
        let wire = to_wire(&app, PeerRole::SimpleClient, None);
        assert_eq!(wire.sender, PeerRole::SimpleClient);
    }

    #[test]
    fn to_wire_omits_absent_client_id_rather_than_null() {
        let app = AppEnvelope::new(PeerRole::SimpleClient, EnvelopeKind::Heartbeat);
        let wire = to_wire(&app, PeerRole::SimpleClient, None);
        assert!(wire.client_id.is_none());
        assert!(wire.to_json().get("client_id").is_none());
    }

    #[test]
    fn to_wire_applies_identity_hint_when_client_id_absent() {
        let app = AppEnvelope::new(PeerRole::SimpleClient, EnvelopeKind::Heartbeat);
        let wire = to_wire(&app, PeerRole::SimpleClient, Some("peer-1"));
        assert_eq!(wire.client_id.as_deref(), Some("peer-1"));
    }

    #[test]
    fn from_wire_rejects_unmapped_elem() {
        let wire = WireEnvelope {
            sender: PeerRole::SimpleClient,
            elem: "not_a_real_kind".to_string(),
            timestamp: None,
            data: None,
            client_id: None,
            request_id: None,
            extra: Default::default(),
        };
        let err = from_wire(&wire).unwrap_err();
        assert_eq!(err.elem, "not_a_real_kind");
    }
}
