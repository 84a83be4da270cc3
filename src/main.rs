// Copyright (c) 2026 HydraRouter Contributors
//
// SPDX-License-Identifier: Apache-2.0
mod cli;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::ShowConfig => {
            let config = hydra_config::load(cli.config.as_deref())
                .context("loading router configuration")?;
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Start => {
            let config = hydra_config::load(cli.config.as_deref())
                .context("loading router configuration")?;
            tracing::info!(bind = %config.bind_addr(), "starting hydra-router");
            hydra_runtime::start(config).await.context("router exited with an error")
        }
    }
}

/// Router always logs to stderr; there is no TUI display to protect from
/// interleaved writes. `RUST_LOG` takes precedence over `-v`/`-vv`.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
