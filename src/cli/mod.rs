// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mysqldiff - MySQL schema upgrade script generator
///
/// Compares two MySQL schema dumps and emits the DDL statements that
/// transform the first schema's structure into the second's.
#[derive(Parser, Debug)]
#[command(name = "mysqldiff")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MySQL schema differencing and upgrade-script generator")]
#[command(long_about = "mysqldiff - MySQL schema upgrade script generator

Compares two MySQL schema dumps and emits an ordered upgrade script.
The plan keeps every intermediate state valid: auto-increment columns
stay indexed, foreign keys keep their backing indexes, and primary keys
evolve atomically with their columns.")]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
  mysqldiff diff old.sql new.sql
  mysqldiff diff --tolerant --no-old-defs old.sql new.sql
  mysqldiff refs --table-re '^billing_' schema.sql")]
pub struct Cli {
    /// Path to configuration file (defaults to .mysqldiff.json)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the upgrade script between two schema dumps
    Diff {
        /// Schema dump to upgrade from
        from: PathBuf,

        /// Schema dump to upgrade to
        to: PathBuf,

        /// Write the plan to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Only consider tables whose name matches this regex
        #[arg(long, value_name = "REGEX")]
        table_re: Option<String>,

        /// Suppress drops and adds; emit only changes
        #[arg(long)]
        only_both: bool,

        /// Suppress drops of tables, views and routines
        #[arg(long)]
        keep_old_tables: bool,

        /// Emit per-change JSON header comments
        #[arg(long)]
        list_tables: bool,

        /// Suppress trailing `# was …` comments
        #[arg(long)]
        no_old_defs: bool,

        /// Loose comparison of column definitions and table options
        #[arg(long)]
        tolerant: bool,

        /// Preserve backticks from the schema dumps
        #[arg(long)]
        save_quotes: bool,
    },

    /// List the transitive FK dependency closure of the schema's tables
    Refs {
        /// Schema dump to analyze
        from: PathBuf,

        /// Only start from tables whose name matches this regex
        #[arg(long, value_name = "REGEX")]
        table_re: Option<String>,

        /// Emit per-table JSON header comments
        #[arg(long)]
        list_tables: bool,

        /// Preserve backticks from the schema dump
        #[arg(long)]
        save_quotes: bool,
    },
}
