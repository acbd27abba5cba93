//! Min-max feature scaling, fitted once over the full catalog.

use anyhow::{bail, Result};

use crate::catalog::{FeatureRow, FEATURE_COUNT};

/// Per-feature (min, max) bounds learned from the catalog.
///
/// Fit exactly once, before clustering. Transforming values that fall outside
/// the fitted bounds is allowed; the result simply lands outside [0, 1] and
/// callers treat it as ordinary data, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    mins: FeatureRow,
    maxs: FeatureRow,
}

impl MinMaxScaler {
    /// Learn per-feature bounds from the full feature matrix.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        if rows.is_empty() {
            bail!("cannot fit scaler on an empty feature matrix");
        }

        let mut mins = [f64::INFINITY; FEATURE_COUNT];
        let mut maxs = [f64::NEG_INFINITY; FEATURE_COUNT];
        for row in rows {
            for (i, &value) in row.iter().enumerate() {
                mins[i] = mins[i].min(value);
                maxs[i] = maxs[i].max(value);
            }
        }

        Ok(Self { mins, maxs })
    }

    /// Scale one feature row into the fitted domain:
    /// `(value - min) / (max - min)` per feature.
    ///
    /// A constant feature (max == min) maps to 0.0.
    #[must_use]
    pub fn transform(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let range = self.maxs[i] - self.mins[i];
            out[i] = if range == 0.0 {
                0.0
            } else {
                (row[i] - self.mins[i]) / range
            };
        }
        out
    }

    #[must_use]
    pub fn mins(&self) -> &FeatureRow {
        &self.mins
    }

    #[must_use]
    pub fn maxs(&self) -> &FeatureRow {
        &self.maxs
    }
}
