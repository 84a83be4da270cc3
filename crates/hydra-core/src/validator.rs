// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Envelope schema validation (C1, §4.1).
//!
//! `validate` is pure: no I/O, no state. It never mutates the registry and
//! never touches the transport — callers decide what to do with the
//! resulting [`WireEnvelope`] or [`ValidationError`].

use serde_json::Value;

use crate::envelope::{PeerRole, WireEnvelope};
use crate::error::ValidationError;

/// Total envelope size cap, per §3.
pub const MAX_ENVELOPE_SIZE: usize = 1024 * 1024;
/// `data` payload size cap, per §3.
pub const MAX_DATA_SIZE: usize = 512 * 1024;

fn json_type_name(v: &Value) -> String {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

/// Validate a raw JSON value as a wire envelope.
///
/// Size is checked before any further structural inspection — per §4.1,
/// "reject over-size envelopes before further processing" bounds the cost of
/// validating a hostile payload.
pub fn validate(raw: &Value) -> Result<WireEnvelope, ValidationError> {
    let size = serde_json::to_vec(raw).map(|b| b.len()).unwrap_or(usize::MAX);
    if size > MAX_ENVELOPE_SIZE {
        return Err(ValidationError::EnvelopeTooLarge {
            size,
            limit: MAX_ENVELOPE_SIZE,
        });
    }

    let obj = match raw {
        Value::Object(obj) => obj,
        other => {
            return Err(ValidationError::NotAMapping {
                actual: json_type_name(other),
            })
        }
    };

    let sender_value = obj
        .get("sender")
        .ok_or(ValidationError::MissingField { field: "sender" })?;
    let sender_str = sender_value.as_str().ok_or_else(|| ValidationError::SenderNotString {
        actual: json_type_name(sender_value),
    })?;
    let sender = PeerRole::parse(sender_str).ok_or_else(|| ValidationError::InvalidRole {
        value: sender_str.to_string(),
    })?;

    let elem_value = obj.get("elem").ok_or(ValidationError::MissingField { field: "elem" })?;
    let elem = match elem_value.as_str() {
        Some(s) if !s.is_empty() => s.to_string(),
        Some(_) => return Err(ValidationError::InvalidElem { actual: "\"\"".to_string() }),
        None => {
            return Err(ValidationError::InvalidElem {
                actual: json_type_name(elem_value),
            })
        }
    };

    let data = match obj.get("data") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => {
            let data_size = serde_json::to_vec(&Value::Object(map.clone()))
                .map(|b| b.len())
                .unwrap_or(usize::MAX);
            if data_size > MAX_DATA_SIZE {
                return Err(ValidationError::DataTooLarge {
                    size: data_size,
                    limit: MAX_DATA_SIZE,
                });
            }
            Some(map.clone())
        }
        Some(other) => {
            return Err(ValidationError::InvalidData {
                actual: json_type_name(other),
            })
        }
    };

    let timestamp = match obj.get("timestamp") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let n = v.as_f64().ok_or_else(|| ValidationError::InvalidTimestamp {
                actual: json_type_name(v),
            })?;
            if n < 0.0 {
                return Err(ValidationError::InvalidTimestamp {
                    actual: n.to_string(),
                });
            }
            Some(n)
        }
    };

    let client_id = validate_optional_string(obj, "client_id")?;
    let request_id = validate_optional_string(obj, "request_id")?;

    let mut extra = obj.clone();
    for key in ["sender", "elem", "data", "timestamp", "client_id", "request_id"] {
        extra.remove(key);
    }

    Ok(WireEnvelope {
        sender,
        elem,
        timestamp,
        data,
        client_id,
        request_id,
        extra,
    })
}

fn validate_optional_string(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
        Some(Value::String(_)) => Err(ValidationError::InvalidOptionalString {
            field,
            actual: "\"\"".to_string(),
        }),
        Some(other) => Err(ValidationError::InvalidOptionalString {
            field,
            actual: json_type_name(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_heartbeat() {
        let raw = json!({"sender": "SimpleClient", "elem": "heartbeat"});
        let env = validate(&raw).unwrap();
        assert_eq!(env.sender, PeerRole::SimpleClient);
        assert_eq!(env.elem, "heartbeat");
        assert!(env.data.is_none());
    }

    #[test]
    fn rejects_non_mapping() {
        let raw = json!([1, 2, 3]);
        assert!(matches!(validate(&raw), Err(ValidationError::NotAMapping { .. })));
    }

    #[test]
    fn rejects_missing_sender() {
        let raw = json!({"elem": "heartbeat"});
        assert!(matches!(validate(&raw), Err(ValidationError::MissingField { field: "sender" })));
    }

    #[test]
    fn rejects_missing_elem() {
        let raw = json!({"sender": "SimpleClient"});
        assert!(matches!(validate(&raw), Err(ValidationError::MissingField { field: "elem" })));
    }

    #[test]
    fn rejects_unknown_role() {
        let raw = json!({"sender": "Martian", "elem": "heartbeat"});
        assert!(matches!(validate(&raw), Err(ValidationError::InvalidRole { .. })));
    }

    #[test]
    fn rejects_empty_elem() {
        let raw = json!({"sender": "SimpleClient", "elem": ""});
        assert!(matches!(validate(&raw), Err(ValidationError::InvalidElem { .. })));
    }

    #[test]
    fn rejects_non_object_data() {
        let raw = json!({"sender": "SimpleClient", "elem": "x", "data": "nope"});
        assert!(matches!(validate(&raw), Err(ValidationError::InvalidData { .. })));
    }

    #[test]
    fn rejects_negative_timestamp() {
        let raw = json!({"sender": "SimpleClient", "elem": "x", "timestamp": -1.0});
        assert!(matches!(validate(&raw), Err(ValidationError::InvalidTimestamp { .. })));
    }

    #[test]
    fn rejects_empty_request_id() {
        let raw = json!({"sender": "SimpleClient", "elem": "x", "request_id": ""});
        assert!(matches!(
            validate(&raw),
            Err(ValidationError::InvalidOptionalString { field: "request_id", .. })
        ));
    }

    #[test]
    fn rejects_oversize_data() {
        let big = "a".repeat(MAX_DATA_SIZE + 10);
        let raw = json!({"sender": "SimpleClient", "elem": "x", "data": {"blob": big}});
        assert!(matches!(validate(&raw), Err(ValidationError::DataTooLarge { .. })));
    }

    #[test]
    fn preserves_unknown_extra_keys() {
        let raw = json!({"sender": "SimpleClient", "elem": "x", "mystery": 42});
        let env = validate(&raw).unwrap();
        assert_eq!(env.extra.get("mystery"), Some(&json!(42)));
    }

    #[test]
    fn request_id_round_trips_through_to_json() {
        let raw = json!({"sender": "SimpleClient", "elem": "x", "request_id": "r1"});
        let env = validate(&raw).unwrap();
        let back = env.to_json();
        assert_eq!(back["request_id"], json!("r1"));
        assert!(back.get("data").is_none(), "absent fields must stay absent, not null");
    }
}
