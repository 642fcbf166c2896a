//! CLI module for Verhaal.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Verhaal - short Dutch stories for language learners
///
/// Generates five-sentence Dutch paragraphs with English translations and key
/// vocabulary, drawing words from a pgvector vocabulary store and the web.
#[derive(Parser, Debug)]
#[command(name = "verhaal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VERHAAL_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate one story and print it
    Ask {
        /// The request, e.g. "A simple story about a football match"
        query: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Load a Dutch/English word list into the vocabulary store
    Ingest {
        /// Word list file, one "dutch: english" pair per line
        file: String,

        /// Delete all stored vocabulary first
        #[arg(long)]
        recreate: bool,

        /// Source label stored with each entry (defaults to the file name)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Look up stored vocabulary for a topic
    Search {
        /// Topic to search for
        topic: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0, defaults to searcher.min_score)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
