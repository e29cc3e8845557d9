use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "drive-curator")]
#[command(about = "Curates a remote drive into a clean taxonomy", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify indexed directories and store a fresh snapshot
    Classify {
        /// Print every result instead of the per-target summary
        #[arg(long)]
        detail: bool,
    },
    /// Summarize what the migration phases would do
    Plan,
    /// Execute one migration phase
    Migrate {
        /// Phase to run: 1 structure, 2 auto-move, 3 review, 4 cleanup
        #[arg(long)]
        phase: u8,
        /// Show planned operations without touching the remote
        #[arg(long)]
        dry_run: bool,
    },
    /// Undo migration moves from one batch, or everything
    Rollback {
        /// Batch id to roll back
        #[arg(long, conflicts_with = "all")]
        batch: Option<String>,
        /// Roll back every batch, newest first
        #[arg(long)]
        all: bool,
        /// List the moves that would be undone
        #[arg(long)]
        dry_run: bool,
    },
    /// Report duplicate groups or delete the safe tier
    Dedup {
        /// Print the tiered duplicate report
        #[arg(long)]
        report: bool,
        /// Delete redundant copies in safe-tier groups
        #[arg(long)]
        execute_safe: bool,
    },
    /// Survey reclaimable space: large and stale files
    Clean {
        /// List the files instead of the totals
        #[arg(long)]
        detail: bool,
    },
    /// Display the category tree
    Taxonomy,
    /// Show file index statistics
    Info,
    /// Print configuration values
    PrintConfig,
}
