//! # Catalog Module
//!
//! The track catalog is the read-mostly heart of Moodtune: an ordered list of
//! tracks, the min-max bounds fitted over their audio features, and the fitted
//! cluster centroids. All three are computed exactly once when the catalog is
//! built and never change afterwards, so a catalog can be shared read-only
//! between requests.
//!
//! Anything a single request derives from the catalog (cluster assignments,
//! preference boosts, recommendation scores) lives in per-request structures
//! owned by the caller, never on the catalog itself.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cluster::{KMeans, KMeansModel};
use crate::normalize::MinMaxScaler;

/// Number of audio features used for clustering and similarity.
pub const FEATURE_COUNT: usize = 5;

/// The fixed feature set, in matrix column order.
pub const FEATURES: [&str; FEATURE_COUNT] =
    ["valence", "energy", "danceability", "acousticness", "tempo"];

/// Number of clusters fitted over the catalog.
///
/// Note the asymmetry: the mood mapper only ever selects cluster ids 0-3.
/// That is deliberate compatibility with the reference behavior, see
/// [`crate::mood`].
pub const CLUSTER_COUNT: usize = 7;

/// Fixed seed for centroid initialization, so a rebuilt catalog clusters
/// identically.
pub const CLUSTER_SEED: u64 = 42;

/// Feature row in catalog column order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// One catalog entry with its raw audio features.
///
/// `track_name` + `artist_name` form the de-duplication identifier. It is not
/// guaranteed globally unique; selection treats every entry sharing the pair
/// as the same song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_name: String,
    pub artist_name: String,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub tempo: f64,
    /// Popularity score, 0-100.
    #[serde(default)]
    pub popularity: u8,
}

impl Track {
    /// The raw feature row, in [`FEATURES`] order.
    #[must_use]
    pub fn features(&self) -> FeatureRow {
        [
            self.valence,
            self.energy,
            self.danceability,
            self.acousticness,
            self.tempo,
        ]
    }

    /// De-duplication key: track name plus artist name.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.track_name, &self.artist_name)
    }
}

/// The full catalog with its fitted normalization bounds and cluster model.
///
/// Built once per process lifetime; read-only afterwards. No online
/// re-fitting ever happens.
#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
    normalized: Vec<FeatureRow>,
    scaler: MinMaxScaler,
    model: KMeansModel,
}

impl Catalog {
    /// Build a catalog with the reference cluster count and seed.
    pub fn build(tracks: Vec<Track>) -> Result<Self> {
        Self::build_with(tracks, CLUSTER_COUNT, CLUSTER_SEED)
    }

    /// Build a catalog with explicit clustering parameters.
    ///
    /// Fits the scaler over the full track list, derives the normalized
    /// feature copy of every track, and fits the cluster model, exactly
    /// once, in that order. Fails on an empty catalog or fewer tracks than
    /// clusters; serving is never allowed to start from a half-fitted state.
    pub fn build_with(tracks: Vec<Track>, k: usize, seed: u64) -> Result<Self> {
        let rows: Vec<FeatureRow> = tracks.iter().map(Track::features).collect();
        let scaler = MinMaxScaler::fit(&rows).context("Failed to fit feature scaler")?;
        let normalized: Vec<FeatureRow> = rows.par_iter().map(|row| scaler.transform(row)).collect();
        let model = KMeans::new(k, seed)
            .fit(&normalized)
            .context("Failed to fit cluster model")?;

        log::info!(
            "Catalog built: {} tracks, {} clusters (seed {seed})",
            tracks.len(),
            k
        );

        Ok(Self {
            tracks,
            normalized,
            scaler,
            model,
        })
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Normalized feature copy of every track, same order as [`tracks`].
    ///
    /// [`tracks`]: Self::tracks
    #[must_use]
    pub fn normalized(&self) -> &[FeatureRow] {
        &self.normalized
    }

    #[must_use]
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    #[must_use]
    pub fn model(&self) -> &KMeansModel {
        &self.model
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Fresh cluster assignment for one request.
    ///
    /// The fitted centroids never move, so repeated assignments agree with
    /// each other; handing out a per-request copy keeps concurrent requests
    /// from sharing mutable scratch state.
    #[must_use]
    pub fn assign_clusters(&self) -> Vec<usize> {
        self.model.predict_all(&self.normalized)
    }
}

/// Read a track list from a JSON file (an array of track objects).
///
/// This is the import side of `init-catalog`; the cleaned source dataset is
/// expected to already carry the five audio features per entry.
pub fn read_tracks_json(path: &Path) -> Result<Vec<Track>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    let tracks: Vec<Track> = serde_json::from_str(&raw)
        .with_context(|| format!("Catalog file {} is not a JSON track array", path.display()))?;
    Ok(tracks)
}
