//! Seeded Lloyd's k-means over normalized audio features.
//!
//! The fitted centroids partition the catalog once at build time and are
//! reused unchanged for every request. Prediction lives on [`KMeansModel`]
//! only; a model exists if and only if `fit` succeeded, so "predict before
//! fit" is unrepresentable rather than a runtime panic.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::catalog::{FeatureRow, FEATURE_COUNT};

/// Default iteration cap; assignments almost always stabilize well before.
const DEFAULT_MAX_ITER: usize = 100;

/// K-means fitting configuration.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    seed: u64,
    max_iter: usize,
}

impl KMeans {
    #[must_use]
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fit centroids over the given rows.
    ///
    /// Initialization draws `k` distinct rows with a seeded RNG, so a fixed
    /// seed reproduces the same partition. Iteration alternates assignment
    /// (nearest centroid by Euclidean distance, ties to the lowest centroid
    /// index) and centroid recomputation (mean of assigned rows; a cluster
    /// that loses all members keeps its previous centroid) until assignments
    /// stop changing or the iteration cap is hit.
    pub fn fit(&self, rows: &[FeatureRow]) -> Result<KMeansModel> {
        if self.k == 0 {
            bail!("cluster count must be at least 1");
        }
        if rows.len() < self.k {
            bail!(
                "cannot fit {} clusters over {} rows; the catalog is too small",
                self.k,
                rows.len()
            );
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let chosen = rand::seq::index::sample(&mut rng, rows.len(), self.k);
        let mut centroids: Vec<FeatureRow> = chosen.iter().map(|i| rows[i]).collect();

        // usize::MAX forces at least one full assignment pass.
        let mut assignments = vec![usize::MAX; rows.len()];
        let mut iterations = 0;
        for iter in 0..self.max_iter {
            iterations = iter + 1;
            let next: Vec<usize> = rows
                .par_iter()
                .map(|row| nearest_centroid(&centroids, row))
                .collect();
            if next == assignments {
                break;
            }
            assignments = next;

            let mut sums = vec![[0.0; FEATURE_COUNT]; self.k];
            let mut counts = vec![0usize; self.k];
            for (row, &cluster) in rows.iter().zip(&assignments) {
                counts[cluster] += 1;
                for (sum, value) in sums[cluster].iter_mut().zip(row) {
                    *sum += value;
                }
            }
            for (centroid, (sum, count)) in centroids.iter_mut().zip(sums.iter().zip(&counts)) {
                if *count > 0 {
                    for (c, s) in centroid.iter_mut().zip(sum) {
                        *c = s / *count as f64;
                    }
                }
            }
        }

        log::debug!(
            "k-means converged after {iterations} iteration(s) for k={}",
            self.k
        );

        Ok(KMeansModel { centroids })
    }
}

/// Fitted centroids. Immutable after fit; safe to share read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    centroids: Vec<FeatureRow>,
}

impl KMeansModel {
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    #[must_use]
    pub fn centroids(&self) -> &[FeatureRow] {
        &self.centroids
    }

    /// Nearest fitted centroid for one row. Centroids do not move.
    #[must_use]
    pub fn predict(&self, row: &FeatureRow) -> usize {
        nearest_centroid(&self.centroids, row)
    }

    /// Nearest fitted centroid for every row.
    #[must_use]
    pub fn predict_all(&self, rows: &[FeatureRow]) -> Vec<usize> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }
}

/// Index of the closest centroid by squared Euclidean distance.
/// Ties break towards the lowest centroid index.
fn nearest_centroid(centroids: &[FeatureRow], row: &FeatureRow) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist: f64 = centroid
            .iter()
            .zip(row)
            .map(|(c, v)| (c - v) * (c - v))
            .sum();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tight blobs far apart plus one straggler.
    fn blobs() -> Vec<FeatureRow> {
        vec![
            [0.1, 0.1, 0.1, 0.1, 0.1],
            [0.12, 0.1, 0.08, 0.1, 0.11],
            [0.09, 0.12, 0.1, 0.12, 0.1],
            [0.9, 0.9, 0.9, 0.9, 0.9],
            [0.88, 0.91, 0.9, 0.89, 0.9],
            [0.91, 0.9, 0.92, 0.9, 0.88],
        ]
    }

    #[test]
    fn fit_rejects_zero_clusters() {
        assert!(KMeans::new(0, 42).fit(&blobs()).is_err());
    }

    #[test]
    fn fit_rejects_more_clusters_than_rows() {
        assert!(KMeans::new(10, 42).fit(&blobs()).is_err());
    }

    #[test]
    fn fit_separates_obvious_blobs() {
        let model = KMeans::new(2, 42).fit(&blobs()).expect("fit should succeed");
        let labels = model.predict_all(&blobs());

        // All points in one blob share a label, and the blobs differ.
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn fit_is_reproducible_for_a_fixed_seed() {
        let rows = blobs();
        let a = KMeans::new(2, 7).fit(&rows).expect("fit should succeed");
        let b = KMeans::new(2, 7).fit(&rows).expect("fit should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn predict_does_not_move_centroids() {
        let model = KMeans::new(2, 42).fit(&blobs()).expect("fit should succeed");
        let before = model.centroids().to_vec();
        // A point far outside the fit domain still gets a nearest centroid.
        let _ = model.predict(&[5.0, 5.0, 5.0, 5.0, 5.0]);
        assert_eq!(model.centroids(), before.as_slice());
    }

    #[test]
    fn equidistant_row_goes_to_lowest_centroid_index() {
        // Fit on two mirrored points so the centroids sit exactly on them.
        let rows = [[0.0, 0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0, 1.0]];
        let model = KMeans::new(2, 42).fit(&rows).expect("fit should succeed");
        let midpoint = [0.5, 0.5, 0.5, 0.5, 0.5];
        assert_eq!(model.predict(&midpoint), 0);
    }

    #[test]
    fn iteration_cap_is_honored() {
        // One pass only; still yields a usable model.
        let model = KMeans::new(2, 42)
            .with_max_iter(1)
            .fit(&blobs())
            .expect("fit should succeed");
        assert_eq!(model.k(), 2);
    }
}
