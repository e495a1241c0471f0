use std::path::PathBuf;

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use phocus::Backend;
use phocus::config::Config;

/// PHP completion language server.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, overriding the PHOCUS_LOG environment variable.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_env("PHOCUS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
    };
    // stdout carries the LSP protocol; everything else goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = args
        .config
        .as_deref()
        .map(Config::load)
        .unwrap_or_default();

    let (service, socket) = LspService::new(|client| Backend::new(client, config));
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}
