//! CLI interface for Progulka
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Progulka route recommendation engine
///
/// Turns a free-text sightseeing query into a time-budgeted walking
/// route through Nizhny Novgorod, served over HTTP for the Telegram
/// mini-app.
#[derive(Parser, Debug)]
#[command(name = "progulka")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (and the Telegram bot when enabled)
    Serve,

    /// Classify a query and print the ranked categories
    Classify {
        /// The free-text query to classify
        query: String,
    },

    /// Run diagnostics: credentials, endpoints, and the catalog file
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["progulka", "serve"]);
        assert!(matches!(cli.command, Command::Serve));
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["progulka", "--log", "debug", "doctor"]);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert!(matches!(cli.command, Command::Doctor));
    }

    #[test]
    fn test_classify_command() {
        let cli = Cli::parse_from(["progulka", "classify", "хочу в музей"]);
        if let Command::Classify { query } = cli.command {
            assert_eq!(query, "хочу в музей");
        } else {
            panic!("Expected Classify command");
        }
    }
}
