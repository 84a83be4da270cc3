// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Peer-side correlation layer (C6) and thin connect/send/receive wrapper
//! used by both HydraRouter clients and servers to talk to the router.

mod client;
mod correlation;
mod error;

pub use client::{PeerClient, UnsolicitedReceiver};
pub use correlation::CorrelationTable;
pub use error::PeerError;
