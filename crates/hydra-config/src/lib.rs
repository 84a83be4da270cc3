// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Layered configuration for the HydraRouter runtime and peer library.
//!
//! Grounded on `sven-config`'s `loader`/`schema` split: defaults live in
//! `schema.rs`, file discovery and merge in `loader.rs`. Layering order,
//! lowest to highest priority: built-in defaults < YAML file < environment
//! variables < explicit CLI flags (the flags are applied by the caller after
//! [`load`] returns, exactly as `sven-config`'s `main.rs` composes
//! `sven_config::load` with `clap` overrides).

mod loader;
mod schema;

pub use loader::load;
pub use schema::{PeerConfig, RouterConfig};
