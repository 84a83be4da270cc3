// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Runtime-fatal error taxonomy (§7): a bind failure or a listening-socket
//! failure escalates here; everything else (validation, parse, transport
//! errors on a specific target) is logged in place and never reaches this
//! type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
