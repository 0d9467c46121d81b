//! scorecap CLI — the main entry point.
//!
//! Commands:
//! - `calculate` / `recent` — Score a hand-entered a/b/c/d breakdown
//! - `preview` / `assign`   — Decompose a percentage and store it
//! - `adjust` / `undo`      — Edit stored records
//! - `view` / `top` / `list` — Inspect the ledger
//! - `caps` / `set-cap`     — Show or change component caps
//! - `shell`                — Run commands interactively

use clap::{Parser, Subcommand};

mod app;
mod commands;
mod confirm;
mod display;

#[derive(Parser)]
#[command(
    name = "scorecap",
    about = "scorecap — capped performance scores and their breakdowns",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin until `exit`
    Shell,

    #[command(flatten)]
    Run(commands::Command),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config =
        scorecap_config::AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut app = app::App::open(config);
    let mut input = commands::stdin_lines();

    let result = match cli.command {
        Commands::Shell => commands::shell::run(&mut app, &mut input).await,
        Commands::Run(command) => commands::dispatch(&mut app, command, &mut input).await,
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    Ok(())
}
