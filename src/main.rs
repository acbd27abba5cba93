//! # Moodtune - Mood-Driven Music Recommendations
//!
//! Moodtune turns "how are you feeling today?" into a playlist: free-text
//! mood input is scored by an external sentiment collaborator, mapped to a
//! valence trajectory, and matched against a pre-clustered track catalog.
//!
//! ## Usage
//!
//! ```bash
//! # Import the catalog once
//! moodtune init-catalog cleaned_spotify.json
//!
//! # Record a couple of preference tracks for personalization
//! moodtune pref add --user u1 --track "So What" --artist "Miles Davis"
//!
//! # One JSON object in, one JSON object out
//! echo '{"mood": "rough week honestly", "user_id": "u1"}' \
//!     | moodtune recommend --sentiment-cmd "python3 sentiment.py"
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{error, info};
use std::io::{self, Read};
use std::path::PathBuf;

use moodtune::catalog::{self, Catalog};
use moodtune::cli;
use moodtune::config::RuntimeConfig;
use moodtune::db;
use moodtune::enrich::PREFERENCE_LIMIT;
use moodtune::recommend::{handle_request, RecommendRequest, RecommendResponse};
use moodtune::sentiment::{CommandScorer, FixedScorer, SentimentScorer};

/// Stands in when no scorer is configured. Empty mood text never reaches it
/// (that short-circuits to neutral), so it only fires for real text that
/// would need a real collaborator.
struct UnconfiguredScorer;

impl SentimentScorer for UnconfiguredScorer {
    fn score(&self, _text: &str) -> Result<f64> {
        bail!(
            "no sentiment scorer configured; pass --sentiment-cmd, --score, \
             or set MOODTUNE_SENTIMENT_CMD"
        )
    }
}

fn main() -> Result<()> {
    // Environment logger, controlled via RUST_LOG.
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::InitCatalog { path, force } => {
            info!("Importing catalog from {}", path.display());
            let config = RuntimeConfig::resolve(args.db)?;
            let tracks = catalog::read_tracks_json(&path)?;
            let mut conn = db::connect(&config.db_path)?;
            db::init_catalog(&mut conn, &tracks, force)?;
            println!("Imported {} tracks into {}", tracks.len(), config.db_path.display());
        }
        cli::Command::List => {
            let config = RuntimeConfig::resolve(args.db)?;
            let conn = db::connect(&config.db_path)?;
            let tracks = db::load_tracks(&conn)?;
            for track in &tracks {
                println!(
                    "{} - {} (valence {:.2}, energy {:.2}, tempo {:.0})",
                    track.artist_name, track.track_name, track.valence, track.energy, track.tempo
                );
            }
            println!("{} track(s)", tracks.len());
        }
        cli::Command::Recommend {
            sentiment_cmd,
            score,
        } => {
            run_recommend(args.db, sentiment_cmd, score)?;
        }
        cli::Command::Pref { action } => match action {
            cli::PrefAction::Add {
                user,
                track,
                artist,
                popularity,
            } => {
                let config = RuntimeConfig::resolve(args.db)?;
                let conn = db::connect(&config.db_path)?;
                db::add_preference(&conn, &user, &track, &artist, popularity)?;
                println!("Recorded preference for {user}: {artist} - {track}");
            }
            cli::PrefAction::List { user } => {
                let config = RuntimeConfig::resolve(args.db)?;
                let conn = db::connect(&config.db_path)?;
                let prefs = db::fetch_preferences(&conn, &user, PREFERENCE_LIMIT)?;
                for pref in &prefs {
                    println!("{} - {} (popularity {})", pref.artist_name, pref.track_name, pref.popularity);
                }
                println!("{} preference(s)", prefs.len());
            }
        },
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            clap_complete::generate(shell, &mut cmd, "moodtune", &mut io::stdout());
        }
    }

    Ok(())
}

/// The recommend command boundary: whatever happens, exactly one JSON object
/// goes to stdout and the process exits cleanly. Database path resolution
/// happens inside the boundary, so even a missing platform data directory
/// surfaces as the error object rather than a bare process failure.
fn run_recommend(
    db_override: Option<PathBuf>,
    sentiment_cmd: Option<String>,
    score: Option<f64>,
) -> Result<()> {
    let output = render_output(try_recommend(db_override, sentiment_cmd, score))?;
    println!("{output}");
    Ok(())
}

/// Render the response, or fold any failure into a single `{"error": ...}`
/// object. Never both, never a mixture.
fn render_output(result: Result<RecommendResponse>) -> Result<String> {
    let value = match result {
        Ok(response) => serde_json::to_value(&response)?,
        Err(err) => {
            error!("Request failed: {err:#}");
            serde_json::json!({ "error": format!("{err:#}") })
        }
    };
    Ok(serde_json::to_string(&value)?)
}

fn try_recommend(
    db_override: Option<PathBuf>,
    sentiment_cmd: Option<String>,
    score: Option<f64>,
) -> Result<RecommendResponse> {
    let config = RuntimeConfig::resolve(db_override)?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")?;
    let request: RecommendRequest =
        serde_json::from_str(&input).context("Malformed request JSON")?;

    let conn = db::connect(&config.db_path)?;
    let tracks = db::load_tracks(&conn)?;
    let catalog = Catalog::build(tracks)?;

    let scorer: Box<dyn SentimentScorer> = match (score, sentiment_cmd) {
        (Some(fixed), _) => Box::new(FixedScorer(fixed)),
        (None, Some(cmd)) => Box::new(CommandScorer::new(&cmd)?),
        (None, None) => Box::new(UnconfiguredScorer),
    };

    handle_request(&catalog, scorer.as_ref(), Some(&conn), &request)
}
