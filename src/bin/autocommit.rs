// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use autocommit::{
    config::load_env_file,
    listener::{listen_for_interrupt, listen_for_quit},
    resolve, Cadence, Identity, Scheduler, Settings,
};

use anyhow::Result;
use clap::Parser;
use std::process::exit;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Commit working tree changes on a fixed cadence.
#[derive(Debug, Clone, Parser)]
#[command(about, version)]
struct Cli {
    /// Path to the Git repository.
    #[arg(short, long, value_name = "path", default_value = ".")]
    pub path: String,

    /// Commit cadence: 0 (30s), 1 (1m), or 2 (2m). Anything else means 1.
    #[arg(
        short,
        long,
        value_name = "n",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub cadence: i64,
}

impl Cli {
    async fn run(self) -> Result<()> {
        load_env_file()?;
        let identity = Identity::from_env()?;
        let settings = Settings::new(self.path, Cadence::from(self.cadence), identity)?;
        let (backend, _) = resolve(&settings.repository)?;

        let token = CancellationToken::new();
        tokio::spawn(listen_for_quit(tokio::io::stdin(), token.clone()));
        tokio::spawn(listen_for_interrupt(token.clone()));

        let mut scheduler = Scheduler::new(backend, settings.identity, settings.cadence);
        scheduler.run(token).await;

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    // INVARIANT: Exit directly, a blocked stdin read would stall runtime shutdown.
    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}
