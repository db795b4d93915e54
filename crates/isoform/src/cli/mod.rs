//! Command-line interface for isoform.
//!
//! This module provides the CLI structure for the `isoform` binary and the
//! terminal views used by `show`.

mod commands;
pub mod view;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ExportCommand, MaydayCommand, MaydayLogCommand, MedicCommand, ReconCommand,
    ResetCommand, SetCommand, ShowCommand,
};

/// isoform - Incident safety officer field form
///
/// Records incident details, four-sided reconnaissance, MEDIC observations
/// and mayday events, asks an AI collaborator for a safety analysis, and
/// exports a printable report.
#[derive(Debug, Parser)]
#[command(name = "isoform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the form
    Show(ShowCommand),

    /// Set a field
    Set(SetCommand),

    /// Reconnaissance actions
    #[command(subcommand)]
    Recon(ReconCommand),

    /// MEDIC record actions
    #[command(subcommand)]
    Medic(MedicCommand),

    /// Mayday actions
    #[command(subcommand)]
    Mayday(MaydayCommand),

    /// Ask the AI for an incident-wide safety analysis
    Analyze,

    /// Discard the whole form
    Reset(ResetCommand),

    /// Export the report
    Export(ExportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Tab;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), "isoform");
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["isoform", "-q", "analyze"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["isoform", "analyze"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["isoform", "-v", "analyze"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["isoform", "-vv", "analyze"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_show_tab() {
        let cli = parse(&["isoform", "show", "--tab", "mayday"]);
        assert!(matches!(
            cli.command,
            Command::Show(ShowCommand {
                tab: Some(Tab::Mayday),
                json: false
            })
        ));
    }

    #[test]
    fn test_parse_set() {
        let cli = parse(&["isoform", "set", "recon.2.fire", "3"]);
        match cli.command {
            Command::Set(cmd) => {
                assert_eq!(cmd.path, "recon.2.fire");
                assert_eq!(cmd.value, "3");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_recon_photo_side_range() {
        assert!(Cli::try_parse_from(["isoform", "recon", "photo", "4", "a.jpg"]).is_ok());
        assert!(Cli::try_parse_from(["isoform", "recon", "photo", "5", "a.jpg"]).is_err());
    }

    #[test]
    fn test_parse_medic_delete() {
        let cli = parse(&["isoform", "medic", "delete", "7", "--yes"]);
        assert!(matches!(
            cli.command,
            Command::Medic(MedicCommand::Delete { id: 7, yes: true })
        ));
    }

    #[test]
    fn test_parse_mayday_log_add() {
        let cli = parse(&["isoform", "mayday", "log", "add", "PASS alarm"]);
        assert!(matches!(
            cli.command,
            Command::Mayday(MaydayCommand::Log(MaydayLogCommand::Add { event: Some(_) }))
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["isoform", "-c", "/custom/config.toml", "export"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
