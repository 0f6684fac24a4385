//! Converse server entry point.
//!
//! Parses CLI arguments, initializes the database and services, and starts
//! the HTTP server.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use converse_api::http::router::build_router;
use converse_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "converse", about = "Conversation orchestration service", version)]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8080", env = "CONVERSE_ADDR")]
    addr: String,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,converse=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let state = AppState::init().await?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&cli.addr).await?;
    tracing::info!(addr = %cli.addr, "converse listening");
    axum::serve(listener, router).await?;

    Ok(())
}
