//! # Recommendation Selector
//!
//! The core selection algorithm. Given the catalog, a fresh per-request
//! cluster assignment and a mood target, it produces an ordered list of up to
//! N distinct tracks.
//!
//! The selection mode is a tagged variant decided once per request from the
//! personalization inputs that are actually available, never inferred by
//! probing optional state mid-walk:
//!
//! - [`SelectionMode::TrajectoryWalk`]: no personalization. Greedy walk along
//!   the valence trajectory, one non-repeating pick per target.
//! - [`SelectionMode::SimilarityScored`]: liked-track feature vectors are
//!   known. Rank the whole cluster by a blended score against the user's mean
//!   normalized feature vector.
//! - [`SelectionMode::BoostScored`]: only scalar boosts are known. Same
//!   blend with the boost standing in for similarity.
//!
//! All scoring scratch (differences, similarities, blended scores) stays
//! local to this module; callers only ever see borrowed [`Track`]s.

use std::cmp::Ordering;
use std::collections::HashSet;

use log::debug;

use crate::catalog::{Catalog, FeatureRow, Track, FEATURE_COUNT};
use crate::mood::MoodTarget;

/// Weight of the similarity/boost term in the blended score.
const SIMILARITY_WEIGHT: f64 = 0.4;
/// Weight of the popularity term.
const POPULARITY_WEIGHT: f64 = 0.3;
/// Weight of the valence-proximity term.
const VALENCE_WEIGHT: f64 = 0.3;

/// How one request selects songs.
#[derive(Debug, Clone)]
pub enum SelectionMode {
    /// Greedy non-repeating walk along the valence trajectory.
    TrajectoryWalk,
    /// Blended ranking against the user's mean normalized feature vector.
    SimilarityScored { user_mean: FeatureRow },
    /// Blended ranking with per-track scalar boosts; tracks without an
    /// explicit boost default to 1.0. Indices align with the catalog.
    BoostScored { boosts: Vec<Option<f64>> },
}

/// Select up to `num_songs` distinct tracks from the target cluster.
///
/// `clusters` is this request's fresh cluster assignment, index-aligned with
/// the catalog. An under-populated (or empty) target cluster yields a short
/// (or empty) result: degraded output, never an error.
#[must_use]
pub fn select<'a>(
    catalog: &'a Catalog,
    clusters: &[usize],
    target: &MoodTarget,
    num_songs: usize,
    mode: &SelectionMode,
) -> Vec<&'a Track> {
    let members: Vec<usize> = clusters
        .iter()
        .enumerate()
        .filter(|&(_, &cluster)| cluster == target.cluster)
        .map(|(i, _)| i)
        .collect();

    debug!(
        "Selecting up to {num_songs} of {} tracks in cluster {}",
        members.len(),
        target.cluster
    );

    match mode {
        SelectionMode::TrajectoryWalk => trajectory_walk(catalog, &members, target, num_songs),
        SelectionMode::SimilarityScored { user_mean } => ranked(
            catalog,
            &members,
            target,
            num_songs,
            |i| similarity(&catalog.normalized()[i], user_mean),
        ),
        SelectionMode::BoostScored { boosts } => ranked(catalog, &members, target, num_songs, |i| {
            boosts.get(i).copied().flatten().unwrap_or(1.0)
        }),
    }
}

/// Mean normalized feature vector over liked catalog entries, or `None` when
/// no liked entries exist (the caller then falls back to another mode).
#[must_use]
pub fn user_mean(catalog: &Catalog, liked: &[usize]) -> Option<FeatureRow> {
    if liked.is_empty() {
        return None;
    }
    let mut mean = [0.0; FEATURE_COUNT];
    for &i in liked {
        for (m, v) in mean.iter_mut().zip(&catalog.normalized()[i]) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= liked.len() as f64;
    }
    Some(mean)
}

/// Mode A: one pick per trajectory target.
///
/// Per target v, the remaining pool member minimizing |valence - v| wins
/// (original valence, not the normalized copy); ties go to the highest
/// energy. The winner's identifier is removed from the pool so a song is
/// never picked twice. Pool exhaustion ends the walk early.
fn trajectory_walk<'a>(
    catalog: &'a Catalog,
    members: &[usize],
    target: &MoodTarget,
    num_songs: usize,
) -> Vec<&'a Track> {
    let tracks = catalog.tracks();
    let mut remaining: Vec<usize> = members.to_vec();
    let mut picked = Vec::new();

    for v in target.trajectory(num_songs) {
        let Some(best) = remaining.iter().copied().min_by(|&a, &b| {
            let diff_a = (tracks[a].valence - v).abs();
            let diff_b = (tracks[b].valence - v).abs();
            diff_a
                .partial_cmp(&diff_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    tracks[b]
                        .energy
                        .partial_cmp(&tracks[a].energy)
                        .unwrap_or(Ordering::Equal)
                })
        }) else {
            debug!(
                "Cluster {} exhausted after {} pick(s)",
                target.cluster,
                picked.len()
            );
            break;
        };

        picked.push(&tracks[best]);
        let key = tracks[best].key();
        remaining.retain(|&i| tracks[i].key() != key);
    }

    picked
}

/// Modes B and C: score every cluster member, sort descending, take the top.
///
/// The sort is stable, so equal scores keep catalog order. Identifiers are
/// still de-duplicated within the result.
fn ranked<'a>(
    catalog: &'a Catalog,
    members: &[usize],
    target: &MoodTarget,
    num_songs: usize,
    affinity: impl Fn(usize) -> f64,
) -> Vec<&'a Track> {
    let tracks = catalog.tracks();
    let midpoint = target.midpoint();

    let mut scored: Vec<(usize, f64)> = members
        .iter()
        .map(|&i| (i, recommendation_score(&tracks[i], affinity(i), midpoint)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut seen = HashSet::new();
    let mut picked = Vec::new();
    for (i, _) in scored {
        if picked.len() >= num_songs {
            break;
        }
        if !seen.insert(tracks[i].key()) {
            continue;
        }
        picked.push(&tracks[i]);
    }
    picked
}

/// Blended score: 0.4·affinity + 0.3·(popularity/100) +
/// 0.3·(1 − |valence − midpoint|).
fn recommendation_score(track: &Track, affinity: f64, midpoint: f64) -> f64 {
    SIMILARITY_WEIGHT * affinity
        + POPULARITY_WEIGHT * (f64::from(track.popularity) / 100.0)
        + VALENCE_WEIGHT * (1.0 - (track.valence - midpoint).abs())
}

/// Per-feature similarity `1 - |a - b|`, averaged across the feature set.
/// Operates on normalized copies so every feature contributes equally.
fn similarity(normalized: &FeatureRow, user_mean: &FeatureRow) -> f64 {
    let total: f64 = normalized
        .iter()
        .zip(user_mean)
        .map(|(a, b)| 1.0 - (a - b).abs())
        .sum();
    total / FEATURE_COUNT as f64
}
