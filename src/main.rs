//! Autopost Admin - operator console for the social-media autoposting backend.

mod api;
mod cli;
mod client;
mod config;
mod error;
mod interact;
mod page_form;
mod poller;
mod prompt_form;
mod schema;
mod server;
mod views;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use config::AdminConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Tables go to stdout, diagnostics to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "autopost_admin=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AdminConfig::from_env()?;

    cli::run(cli, config).await
}
