//! CLI command definitions for the `docfill` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod artifacts;
pub mod config;
pub mod extract;
pub mod generate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use docfill_types::template::RequestId;

/// Fill legal document templates from client answers.
#[derive(Parser)]
#[command(name = "docfill", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the placeholder inventory of a template file.
    Extract {
        /// Template file to scan.
        file: PathBuf,
    },

    /// Generate one document per template from a set of answers.
    #[command(alias = "gen")]
    Generate(generate::GenerateArgs),

    /// List the stored artifacts of one generation request.
    Artifacts {
        /// Request id printed by `docfill generate`.
        request_id: RequestId,
    },

    /// Print the effective configuration.
    Config {
        /// Send a minimal request to the configured provider.
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_requires_answers_or_intake() {
        assert!(Cli::try_parse_from(["docfill", "generate", "will.html"]).is_err());
        assert!(
            Cli::try_parse_from([
                "docfill", "generate", "will.html", "--answers", "a.json", "--intake", "i-1"
            ])
            .is_err()
        );

        let cli = Cli::try_parse_from([
            "docfill", "-v", "generate", "will.html", "trust.html", "--intake", "i-1", "--deterministic",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.template_ids, vec!["will.html", "trust.html"]);
                assert_eq!(args.intake.as_deref(), Some("i-1"));
                assert!(args.deterministic);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_artifacts_parses_request_id() {
        let cli = Cli::try_parse_from([
            "docfill",
            "artifacts",
            "01890a5d-ac96-774b-bcce-b302099a8057",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Artifacts { .. }));
        assert!(Cli::try_parse_from(["docfill", "artifacts", "not-a-uuid"]).is_err());
    }
}
