//! Command-line argument parsing for Tabsight.
//!
//! Uses clap to parse the subcommands and the global overrides they share.

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AI-assisted spreadsheet analysis toolbox.
#[derive(Parser, Debug)]
#[command(name = "tabsight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model name or alias ("small"/"large"); overrides the config
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Use the deterministic mock generator (offline, no API key required)
    #[arg(long)]
    pub mock_llm: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Tabsight subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a spreadsheet to a snappy-compressed Parquet file
    Convert {
        /// Path to the spreadsheet file (.xlsx/.xls/.ods)
        data_file: PathBuf,

        /// Output path (defaults to the processed dir with the source stem)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Run analysis instructions against a spreadsheet
    Analyze {
        /// Path to the spreadsheet file
        data_file: PathBuf,

        /// Analysis instruction; opens an interactive loop when omitted
        instruction: Option<String>,
    },

    /// Replay a query file against the generate-and-execute pipeline
    Batch {
        /// Path to the spreadsheet file
        data_file: PathBuf,

        /// Path to the query file
        queries_file: PathBuf,

        /// Write the finalized report to this JSON file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to load (explicit or platform default).
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies CLI overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if self.mock_llm {
            config.llm.provider = "mock".to_string();
        }
    }
}
