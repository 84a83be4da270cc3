// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Router runtime (C5): binds the server-side WebSocket socket, runs the
//! receive loop and the prune loop, and owns the registry, adapter, and
//! dispatcher from `hydra-core`.

mod connections;
mod error;
mod prune;
mod router;
mod ws;

pub use connections::ConnectionTable;
pub use error::RuntimeError;
pub use router::{start, RouterState};
