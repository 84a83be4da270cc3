// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Peer-side error taxonomy (§7): the uniform failure channel a peer
//! library's caller sees, distinguishing conversion, transport, and timeout
//! kinds rather than exposing one opaque error.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("envelope validation failed: {0}")]
    Validation(#[from] hydra_core::ValidationError),

    #[error("envelope conversion failed: {0}")]
    Conversion(#[from] hydra_core::ConversionError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request {operation:?} timed out after {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },

    #[error("peer is shutting down")]
    Shutdown,
}
