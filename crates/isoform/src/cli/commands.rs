//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::controller::Tab;

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Show only this tab
    #[arg(short, long, value_enum)]
    pub tab: Option<Tab>,

    /// Output the raw form document as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Set command arguments.
#[derive(Debug, Args)]
pub struct SetCommand {
    /// Dotted field path, e.g. `incident_name` or `recon.2.fire`
    pub path: String,

    /// New value ("now" for time fields)
    pub value: String,
}

/// RECON commands.
#[derive(Debug, Subcommand)]
pub enum ReconCommand {
    /// Attach a photo to one side
    Photo {
        /// Side number (1-4)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=4))]
        side: u8,

        /// Image file
        file: PathBuf,
    },
}

/// MEDIC record commands.
#[derive(Debug, Subcommand)]
pub enum MedicCommand {
    /// Add a new record at the top of the list
    Add,

    /// Set one field of a record
    Set {
        /// Record id
        id: u64,

        /// Field: time, monitor, analysis, communicate
        field: String,

        /// New value
        value: String,
    },

    /// Attach a photo to a record
    Photo {
        /// Record id
        id: u64,

        /// Image file
        file: PathBuf,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: u64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask the AI to assess a record
    Analyze {
        /// Record id
        id: u64,
    },
}

/// Mayday commands.
#[derive(Debug, Subcommand)]
pub enum MaydayCommand {
    /// Manage the event log
    #[command(subcommand)]
    Log(MaydayLogCommand),
}

/// Mayday event log commands.
#[derive(Debug, Subcommand)]
pub enum MaydayLogCommand {
    /// Add a new entry at the top of the log
    Add {
        /// Event text
        event: Option<String>,
    },

    /// Set one field of an entry
    Set {
        /// Entry id
        id: u64,

        /// Field: time, event
        field: String,

        /// New value
        value: String,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: u64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Output directory (defaults to the configured export directory)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
