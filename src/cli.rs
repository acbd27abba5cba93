//! # Command-Line Interface Module
//!
//! Defines the Moodtune command line using Clap derive macros.
//!
//! ## Commands
//!
//! - `init-catalog`: import a track catalog from a JSON file
//! - `list`: display all catalogued tracks
//! - `recommend`: read one JSON request from stdin, write one JSON response
//! - `pref`: manage stored user preference tracks
//! - `completion`: generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! moodtune init-catalog cleaned_spotify.json
//! echo '{"mood": "rough day", "user_id": "u1"}' | moodtune recommend
//! ```

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "moodtune")]
#[command(about = "Moodtune: mood-to-music playlists from free-text sentiment")]
#[command(version)]
pub struct Args {
    /// Path to the catalog database (defaults to the platform data dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Import a track catalog from a JSON file
    ///
    /// The file is expected to hold a JSON array of track objects carrying
    /// track_name, artist_name, the five audio features (valence, energy,
    /// danceability, acousticness, tempo) and optionally popularity.
    InitCatalog {
        /// Path to the catalog JSON file
        path: PathBuf,

        /// Replace an existing catalog instead of refusing
        #[arg(long)]
        force: bool,
    },

    /// List all catalogued tracks with their audio features
    List,

    /// Generate recommendations for one request
    ///
    /// Reads exactly one JSON object from stdin ({"mood": ..., "user_id":
    /// ..., "num_songs": ...}) and writes exactly one JSON object to stdout:
    /// either sentiment_score plus recommendations, or a single error field.
    Recommend {
        /// External sentiment scoring command (JSON over stdin/stdout)
        #[arg(long, env = "MOODTUNE_SENTIMENT_CMD", value_name = "CMD")]
        sentiment_cmd: Option<String>,

        /// Fixed sentiment score, bypassing the external scorer
        #[arg(long, conflicts_with = "sentiment_cmd", allow_hyphen_values = true)]
        score: Option<f64>,
    },

    /// Manage stored user preference tracks
    Pref {
        #[command(subcommand)]
        action: PrefAction,
    },

    /// Generate shell completions
    ///
    /// Usage: moodtune completion bash > ~/.local/share/bash-completion/completions/moodtune
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Preference management actions.
#[derive(Subcommand)]
pub enum PrefAction {
    /// Record a preference track for a user
    Add {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Preferred track name
        #[arg(long)]
        track: String,

        /// Preferred artist name
        #[arg(long)]
        artist: String,

        /// Popularity score 0-100
        #[arg(long, default_value = "50")]
        popularity: u8,
    },

    /// List stored preferences for a user, most recent first
    List {
        /// User identifier
        #[arg(long)]
        user: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn recommend_accepts_negative_fixed_scores() {
        let args = Args::try_parse_from(["moodtune", "recommend", "--score", "-0.8"])
            .expect("should parse");
        match args.command {
            Command::Recommend { score, .. } => assert_eq!(score, Some(-0.8)),
            _ => panic!("expected recommend command"),
        }
    }

    #[test]
    fn db_override_is_global() {
        let args = Args::try_parse_from(["moodtune", "list", "--db", "/tmp/x.db"])
            .expect("should parse");
        assert_eq!(args.db, Some(PathBuf::from("/tmp/x.db")));
    }
}
