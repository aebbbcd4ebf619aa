//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};
use switchboard_core::SearchField;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON state file; loaded instead of the data files when present
    #[arg(short, long)]
    pub state: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search contacts by prefix, most popular first
    Search {
        /// Field to search: first, last or phone
        field: SearchField,
        /// Prefix to look up
        text: String,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Complete a prefix from a wider candidate pool
    Autocomplete {
        /// Field to complete: first, last or phone
        #[arg(short, long, default_value = "first")]
        field: SearchField,
        prefix: String,
        /// Maximum number of completions
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show the call history of a number
    History { number: String },
    /// Show the calls between two numbers
    Between { first: String, second: String },
    /// Show the most popular numbers
    Top {
        #[arg(short, default_value_t = 10)]
        n: usize,
    },
    /// Suggest known numbers or names close to a query
    Suggest {
        query: String,
        /// Match against contact names instead of numbers
        #[arg(long)]
        names: bool,
    },
    /// Replay a call file through the blocklist
    Simulate {
        /// Call file (defaults to the configured calls file)
        #[arg(short, long)]
        file: Option<String>,
        /// Maximum number of lines to replay
        #[arg(short, long, default_value_t = 2000)]
        limit: usize,
    },
    /// Generate synthetic traffic until done or interrupted
    Stress {
        /// Run time in seconds
        #[arg(short, long, default_value_t = 60)]
        seconds: u64,
        /// Number of calls to generate
        #[arg(short, long, default_value_t = 1000)]
        calls: u64,
    },
    /// Write the current state to a JSON file
    Save { output: String },
    /// Print an example configuration file
    ExampleConfig,
}
