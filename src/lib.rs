//! Mood-driven music recommendations.
//!
//! Moodtune maps free-text mood input to a sentiment score, then selects
//! songs from a pre-clustered catalog whose audio attributes gradually move
//! the listener from their current emotional state toward a happier one.
//!
//! Core modules:
//! - [`normalize`] - Min-max feature scaling, fitted once over the catalog
//! - [`cluster`] - Seeded k-means fitting and prediction
//! - [`mood`] - Sentiment-score-to-trajectory mapping
//! - [`selector`] - The recommendation selection algorithm
//! - [`enrich`] - User preference enrichment (soft-failing I/O boundary)
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Track data model and the fitted read-only catalog
//! - [`db`] - SQLite persistence for catalog and preferences
//! - [`sentiment`] - Opaque sentiment scoring collaborator
//! - [`recommend`] - Request pipeline and JSON request/response types
//! - [`config`] - Data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//!
//! ## Quick Start Example
//!
//! ```
//! use moodtune::catalog::{Catalog, Track};
//! use moodtune::recommend::{handle_request, RecommendRequest};
//! use moodtune::sentiment::FixedScorer;
//!
//! let tracks: Vec<Track> = (0..20)
//!     .map(|i| Track {
//!         track_name: format!("Track {i}"),
//!         artist_name: "Some Artist".to_string(),
//!         valence: f64::from(i) / 19.0,
//!         energy: 0.5,
//!         danceability: 0.5,
//!         acousticness: 0.5,
//!         tempo: 120.0,
//!         popularity: 50,
//!     })
//!     .collect();
//!
//! let catalog = Catalog::build(tracks)?;
//! let request = RecommendRequest {
//!     mood: "could be better".to_string(),
//!     ..Default::default()
//! };
//!
//! let response = handle_request(&catalog, &FixedScorer(-0.4), None, &request)?;
//! assert!(response.recommendations.len() <= 10);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! One request flows through: sentiment score → mood target (cluster filter
//! plus valence range) → fresh per-request cluster assignment → optional
//! preference enrichment → selection mode decision → ordered, non-repeating
//! track list. The catalog's fitted parameters (normalization bounds,
//! centroids) are computed once at build time and shared read-only; all
//! per-request scratch lives in request-local structures.
//!
//! ## Error Handling
//!
//! Public functions return `Result<T, anyhow::Error>`. Catalog build
//! failures are fatal (serving never starts from a half-fitted state);
//! preference store failures degrade to unpersonalized selection; cluster
//! exhaustion silently yields a short list; everything else is surfaced at
//! the request boundary as the single `{"error": ...}` output object.
//!
//! Logging goes through the `log` facade and is controlled via `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=debug moodtune recommend
//! RUST_LOG=moodtune::selector=debug moodtune recommend
//! ```

pub mod catalog;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod db;
pub mod enrich;
pub mod mood;
pub mod normalize;
pub mod recommend;
pub mod selector;
pub mod sentiment;
