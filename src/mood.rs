//! Sentiment-to-trajectory mapping.
//!
//! A scalar sentiment score picks a cluster filter and a valence range; the
//! range is stretched into a per-song trajectory that nudges the listener
//! from their current state toward a happier one.

/// Where a request should head: a predicted-cluster filter plus the valence
/// range to walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodTarget {
    /// Literal predicted-cluster-id filter. Only ids 0-3 are ever produced
    /// even though the catalog fits 7 clusters. Preserved reference
    /// behavior, not re-derived from centroid proximity.
    pub cluster: usize,
    pub start_valence: f64,
    pub end_valence: f64,
}

/// Map a sentiment score to its mood target.
///
/// Piecewise rule evaluated top to bottom, first match wins. Boundary scores
/// (-0.75, -0.25, 0.25 exactly) land in the lower branch. Scores are
/// conventionally in [-1, 1] but are deliberately not clamped.
#[must_use]
pub fn map_sentiment(score: f64) -> MoodTarget {
    if score <= -0.75 {
        MoodTarget {
            cluster: 0,
            start_valence: 0.20,
            end_valence: 0.75,
        }
    } else if score <= -0.25 {
        MoodTarget {
            cluster: 1,
            start_valence: 0.35,
            end_valence: 0.80,
        }
    } else if score <= 0.25 {
        MoodTarget {
            cluster: 2,
            start_valence: 0.50,
            end_valence: 0.90,
        }
    } else {
        MoodTarget {
            cluster: 3,
            start_valence: 0.75,
            end_valence: 1.00,
        }
    }
}

impl MoodTarget {
    /// Midpoint of the valence range, used by the scored selection modes.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.start_valence + self.end_valence) / 2.0
    }

    /// `n` valence targets linearly interpolated from start to end,
    /// endpoints included. `n == 1` yields just the start value.
    #[must_use]
    pub fn trajectory(&self, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![self.start_valence],
            _ => {
                let step = (self.end_valence - self.start_valence) / (n - 1) as f64;
                (0..n)
                    .map(|i| self.start_valence + step * i as f64)
                    .collect()
            }
        }
    }
}
