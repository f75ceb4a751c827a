use std::fmt;

use clap::{Parser, Subcommand};

/// Synchronizes the sakila operational database into a SQLite star schema.
#[derive(Debug, Parser)]
#[command(name = "etl-replicator")]
#[command(about = "Synchronizes the sakila database into a SQLite star schema")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create the star schema and fill the date dimension
    Init,
    /// Clear the warehouse and reload the full source history
    FullLoad,
    /// Load the rows changed since the last run
    Incremental,
    /// Compare row counts and total revenue between source and warehouse
    Validate,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::FullLoad => "full-load",
            Command::Incremental => "incremental",
            Command::Validate => "validate",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
