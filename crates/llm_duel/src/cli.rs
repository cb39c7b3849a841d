//! Command-line interface for llm_duel.

use clap::{Parser, Subcommand};

/// LLM Duel - tic-tac-toe between language models
#[derive(Parser, Debug)]
#[command(name = "llm_duel")]
#[command(about = "Referee tic-tac-toe matches between LLM agents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to match configuration. Defaults are used if the file is missing.
    #[arg(short, long, global = true, default_value = "duel.toml")]
    pub config: std::path::PathBuf,

    /// Override `debug_mode` from the configuration
    #[arg(long, global = true)]
    pub debug: Option<bool>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one game and print the result
    Play {
        /// Print the game record as JSON instead of the final board
        #[arg(long)]
        json: bool,
    },

    /// Play several games concurrently and print a summary
    Batch {
        /// Number of games to run
        #[arg(short, long, default_value = "4")]
        games: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_with_global_flags() {
        let cli = Cli::parse_from(["llm_duel", "play", "--json", "--debug", "false"]);
        assert_eq!(cli.debug, Some(false));
        assert_eq!(cli.config, std::path::PathBuf::from("duel.toml"));
        assert!(matches!(cli.command, Command::Play { json: true }));
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::parse_from(["llm_duel", "--config", "match.toml", "batch", "-g", "10"]);
        assert_eq!(cli.config, std::path::PathBuf::from("match.toml"));
        assert!(matches!(cli.command, Command::Batch { games: 10 }));
    }
}
