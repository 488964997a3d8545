//! docfill CLI entry point.
//!
//! Binary name: `docfill`
//!
//! Parses CLI arguments, initializes tracing and application state, then
//! dispatches to the command handler.

mod cli;
mod state;

use std::process::ExitCode;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = docfill_observe::tracing_setup::filter_for_verbosity(cli.verbose, cli.quiet);
    docfill_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    docfill_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Commands that need no data directory
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "docfill", &mut std::io::stdout());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Extract { file } => {
            cli::extract::extract(file, cli.json).await?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Generate(args) => {
            let all_succeeded = cli::generate::generate(&state, args, cli.json, cli.quiet).await?;
            if !all_succeeded {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Artifacts { request_id } => {
            cli::artifacts::list_artifacts(&state, &request_id, cli.json).await?;
        }

        Commands::Config { check } => {
            cli::config::show_config(&state, check, cli.json).await?;
        }

        Commands::Completions { .. } | Commands::Extract { .. } => unreachable!("handled above"),
    }

    Ok(ExitCode::SUCCESS)
}
