//! Command-line argument parsing for regassist
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::corpus::ChunkType;

/// regassist - search regulation and Q&A corpora with retrieve-then-rerank
#[derive(Parser, Debug)]
#[command(name = "regassist")]
#[command(version)]
#[command(about = "Two-stage retrieval over regulation documents and Q&A history", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Regulation document (overrides config)
    #[arg(long, global = true)]
    pub regulations: Option<PathBuf>,

    /// Q&A dataset (overrides config)
    #[arg(long, global = true)]
    pub qa: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress everything except results)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve and rerank chunks for a query
    Search {
        /// Natural-language query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Candidates kept after similarity retrieval
        #[arg(long)]
        top_k: Option<usize>,

        /// Chunks kept after reranking
        #[arg(long)]
        final_k: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the chunks the corpus loader produces
    Chunks {
        /// Only show chunks of this type
        #[arg(long = "type", value_enum)]
        chunk_type: Option<ChunkTypeArg>,
    },

    /// Display current configuration
    Config,
}

/// CLI spelling of `ChunkType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChunkTypeArg {
    Regulation,
    Qa,
}

impl From<ChunkTypeArg> for ChunkType {
    fn from(arg: ChunkTypeArg) -> Self {
        match arg {
            ChunkTypeArg::Regulation => ChunkType::Regulation,
            ChunkTypeArg::Qa => ChunkType::Qa,
        }
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Apply path and search overrides on top of a loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.regulations {
            config.corpus.regulation_path = path.to_string_lossy().into_owned();
        }
        if let Some(path) = &self.qa {
            config.corpus.qa_path = Some(path.to_string_lossy().into_owned());
        }
        if let Commands::Search { top_k, final_k, .. } = &self.command {
            if let Some(top_k) = top_k {
                config.retrieval.top_k = *top_k;
            }
            match final_k {
                Some(final_k) => config.rerank.final_k = *final_k,
                // A narrower --top-k pulls the configured final_k down with it
                None => config.rerank.final_k = config.rerank.final_k.min(config.retrieval.top_k),
            }
        }
    }
}

impl Verbosity {
    /// Parse the config-file spelling
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show scores and stage counts
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
