// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Structured diagnostics for validation and conversion failures (§4.1, §7).

use serde::Serialize;
use thiserror::Error;

use crate::validator::{MAX_DATA_SIZE, MAX_ENVELOPE_SIZE};

/// A structured description of a validation failure: the offending field,
/// what shape was expected, what was actually seen, and a free-form hint —
/// the only window into peer misbehavior per §9's logging note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("envelope must be a JSON object, got {actual}")]
    NotAMapping { actual: String },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `sender` has invalid role `{value}`")]
    InvalidRole { value: String },

    #[error("field `sender` must be a string, got {actual}")]
    SenderNotString { actual: String },

    #[error("field `elem` must be a non-empty string, got {actual}")]
    InvalidElem { actual: String },

    #[error("field `data` must be a JSON object, got {actual}")]
    InvalidData { actual: String },

    #[error("field `timestamp` must be a non-negative number, got {actual}")]
    InvalidTimestamp { actual: String },

    #[error("field `{field}` must be a non-empty string, got {actual}")]
    InvalidOptionalString { field: &'static str, actual: String },

    #[error("envelope size {size} bytes exceeds the {limit} byte cap")]
    EnvelopeTooLarge { size: usize, limit: usize },

    #[error("`data` payload size {size} bytes exceeds the {limit} byte cap")]
    DataTooLarge { size: usize, limit: usize },
}

impl ValidationError {
    /// Render this error as the structured diagnostic §4.1 calls for.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            ValidationError::NotAMapping { actual } => Diagnostic {
                field: "<root>".into(),
                expected: "JSON object".into(),
                actual: actual.clone(),
                hint: "envelopes must be encoded as a JSON object, not an array or scalar".into(),
            },
            ValidationError::MissingField { field } => Diagnostic {
                field: field.to_string(),
                expected: "present".into(),
                actual: "absent".into(),
                hint: format!("`{field}` is required on every envelope"),
            },
            ValidationError::SenderNotString { actual } => Diagnostic {
                field: "sender".into(),
                expected: "string".into(),
                actual: actual.clone(),
                hint: "sender must be one of the closed peer-role strings".into(),
            },
            ValidationError::InvalidRole { value } => Diagnostic {
                field: "sender".into(),
                expected: "HydraClient | HydraServer | SimpleClient | SimpleServer | HydraRouter".into(),
                actual: value.clone(),
                hint: "unrecognized peer role".into(),
            },
            ValidationError::InvalidElem { actual } => Diagnostic {
                field: "elem".into(),
                expected: "non-empty string".into(),
                actual: actual.clone(),
                hint: "elem names the envelope kind and cannot be blank".into(),
            },
            ValidationError::InvalidData { actual } => Diagnostic {
                field: "data".into(),
                expected: "JSON object".into(),
                actual: actual.clone(),
                hint: "data must be a mapping when present".into(),
            },
            ValidationError::InvalidTimestamp { actual } => Diagnostic {
                field: "timestamp".into(),
                expected: "number >= 0".into(),
                actual: actual.clone(),
                hint: "timestamp is seconds-since-epoch on the producer's clock".into(),
            },
            ValidationError::InvalidOptionalString { field, actual } => Diagnostic {
                field: field.to_string(),
                expected: "non-empty string".into(),
                actual: actual.clone(),
                hint: format!("`{field}` must be omitted or a non-empty string"),
            },
            ValidationError::EnvelopeTooLarge { size, limit } => Diagnostic {
                field: "<root>".into(),
                expected: format!("<= {limit} bytes (actual limit {MAX_ENVELOPE_SIZE})"),
                actual: format!("{size} bytes"),
                hint: "envelope exceeds the maximum total size".into(),
            },
            ValidationError::DataTooLarge { size, limit } => Diagnostic {
                field: "data".into(),
                expected: format!("<= {limit} bytes (actual limit {MAX_DATA_SIZE})"),
                actual: format!("{size} bytes"),
                hint: "data payload exceeds the maximum size".into(),
            },
        }
    }
}

/// Raised when the adapter encounters an `elem` outside the closed
/// [`crate::envelope::EnvelopeKind`] enumeration. The adapter is total and
/// symmetric by construction, so this only ever fires on `from_wire`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized envelope kind `{elem}`")]
pub struct ConversionError {
    pub elem: String,
}

/// Bytes received on the transport that could not be parsed as JSON at all.
/// Distinct from [`ValidationError`] — the envelope never reached schema
/// validation because it wasn't well-formed JSON.
#[derive(Debug, Error)]
#[error("failed to parse envelope bytes: {source}")]
pub struct ParseError {
    #[source]
    pub source: serde_json::Error,
    /// First 200 bytes of the offending payload, for log context.
    pub truncated_payload: String,
}
