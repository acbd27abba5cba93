//! User preference enrichment.
//!
//! The enricher is the only I/O boundary inside a request: one bounded
//! lookup against the preference store, with a "proceed unenriched" fallback
//! when the store cannot be reached. Enrichment is an optimization, never a
//! correctness requirement, so there are no retries.

use anyhow::Result;
use log::{debug, warn};

use crate::catalog::Catalog;
use crate::db;

/// Boost applied to catalog entries matching a preference track.
pub const PREFERENCE_BOOST: f64 = 1.2;

/// At most this many preference tracks are consulted, most recent first.
pub const PREFERENCE_LIMIT: usize = 5;

/// One stored preference signal for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceTrack {
    pub track_name: String,
    pub artist_name: String,
    pub popularity: u8,
}

/// Narrow interface to the preference store.
pub trait PreferenceSource {
    /// Up to [`PREFERENCE_LIMIT`] most-recently-updated preference tracks
    /// for the given user. An unknown user yields an empty list.
    fn fetch_preferences(&self, user_id: &str) -> Result<Vec<PreferenceTrack>>;
}

impl PreferenceSource for rusqlite::Connection {
    fn fetch_preferences(&self, user_id: &str) -> Result<Vec<PreferenceTrack>> {
        db::fetch_preferences(self, user_id, PREFERENCE_LIMIT)
    }
}

/// Per-request enrichment outcome. Pure scratch state: the catalog itself is
/// never marked.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Catalog indices identified as liked songs (track-name match), whose
    /// feature vectors can feed a user mean.
    pub liked: Vec<usize>,
    /// Boost per catalog index, aligned with the track list. Set for every
    /// match, including artist-only ones.
    pub boosts: Vec<Option<f64>>,
}

impl Enrichment {
    /// An outcome carrying no signal at all.
    #[must_use]
    pub fn unenriched(catalog_len: usize) -> Self {
        Self {
            liked: Vec::new(),
            boosts: vec![None; catalog_len],
        }
    }

    #[must_use]
    pub fn has_boosts(&self) -> bool {
        self.boosts.iter().any(Option::is_some)
    }
}

/// Look up a user's preference tracks and mark matching catalog entries.
///
/// Matching is a case-insensitive substring test: a catalog entry whose
/// track name contains a preference track's name counts as that song itself
/// (it becomes `liked` and boosted); an entry whose artist merely contains a
/// preference artist gets the boost but no liked vector; knowing the artist
/// is a scalar affinity, not a feature vector.
///
/// Any failure reaching the store is logged and degrades to an unenriched
/// outcome; it never propagates to the request.
#[must_use]
pub fn enrich(catalog: &Catalog, source: &dyn PreferenceSource, user_id: &str) -> Enrichment {
    let preferences = match source.fetch_preferences(user_id) {
        Ok(preferences) => preferences,
        Err(err) => {
            warn!("Preference lookup failed for user `{user_id}`: {err:#}. Proceeding unenriched.");
            return Enrichment::unenriched(catalog.len());
        }
    };
    if preferences.is_empty() {
        debug!("No stored preferences for user `{user_id}`");
        return Enrichment::unenriched(catalog.len());
    }

    // Empty needles would match the whole catalog; skip them.
    let name_needles: Vec<String> = preferences
        .iter()
        .map(|p| p.track_name.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    let artist_needles: Vec<String> = preferences
        .iter()
        .map(|p| p.artist_name.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    let mut enrichment = Enrichment::unenriched(catalog.len());
    for (i, track) in catalog.tracks().iter().enumerate() {
        let name = track.track_name.to_lowercase();
        let artist = track.artist_name.to_lowercase();

        if name_needles.iter().any(|needle| name.contains(needle)) {
            enrichment.liked.push(i);
            enrichment.boosts[i] = Some(PREFERENCE_BOOST);
        } else if artist_needles.iter().any(|needle| artist.contains(needle)) {
            enrichment.boosts[i] = Some(PREFERENCE_BOOST);
        }
    }

    debug!(
        "Enrichment for user `{user_id}`: {} liked, {} boosted",
        enrichment.liked.len(),
        enrichment.boosts.iter().filter(|b| b.is_some()).count()
    );
    enrichment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Track;
    use anyhow::anyhow;

    struct FixedSource(Vec<PreferenceTrack>);

    impl PreferenceSource for FixedSource {
        fn fetch_preferences(&self, _user_id: &str) -> Result<Vec<PreferenceTrack>> {
            Ok(self.0.clone())
        }
    }

    struct UnreachableSource;

    impl PreferenceSource for UnreachableSource {
        fn fetch_preferences(&self, _user_id: &str) -> Result<Vec<PreferenceTrack>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn pref(name: &str, artist: &str) -> PreferenceTrack {
        PreferenceTrack {
            track_name: name.to_string(),
            artist_name: artist.to_string(),
            popularity: 50,
        }
    }

    fn track(name: &str, artist: &str) -> Track {
        Track {
            track_name: name.to_string(),
            artist_name: artist.to_string(),
            valence: 0.5,
            energy: 0.5,
            danceability: 0.5,
            acousticness: 0.5,
            tempo: 120.0,
            popularity: 50,
        }
    }

    fn fixture() -> Catalog {
        Catalog::build_with(
            vec![
                track("Blue in Green", "Miles Davis"),
                track("So What", "Miles Davis"),
                track("Karma Police", "Radiohead"),
                track("Unrelated", "Someone Else"),
            ],
            2,
            42,
        )
        .expect("fixture catalog should build")
    }

    #[test]
    fn name_match_is_liked_and_boosted() {
        let catalog = fixture();
        let source = FixedSource(vec![pref("blue in green", "miles davis")]);

        let enrichment = enrich(&catalog, &source, "u1");
        assert_eq!(enrichment.liked, vec![0]);
        assert_eq!(enrichment.boosts[0], Some(PREFERENCE_BOOST));
    }

    #[test]
    fn artist_match_boosts_without_liking() {
        let catalog = fixture();
        let source = FixedSource(vec![pref("blue in green", "miles davis")]);

        let enrichment = enrich(&catalog, &source, "u1");
        // "So What" matches by artist only.
        assert!(!enrichment.liked.contains(&1));
        assert_eq!(enrichment.boosts[1], Some(PREFERENCE_BOOST));
        assert_eq!(enrichment.boosts[3], None);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let catalog = fixture();
        let source = FixedSource(vec![pref("KARMA", "nobody")]);

        let enrichment = enrich(&catalog, &source, "u1");
        assert_eq!(enrichment.liked, vec![2]);
    }

    #[test]
    fn no_preferences_leaves_catalog_unmarked() {
        let catalog = fixture();
        let source = FixedSource(Vec::new());

        let enrichment = enrich(&catalog, &source, "u1");
        assert!(enrichment.liked.is_empty());
        assert!(!enrichment.has_boosts());
    }

    #[test]
    fn unreachable_store_degrades_instead_of_failing() {
        let catalog = fixture();
        let enrichment = enrich(&catalog, &UnreachableSource, "u1");
        assert!(enrichment.liked.is_empty());
        assert!(!enrichment.has_boosts());
        assert_eq!(enrichment.boosts.len(), catalog.len());
    }

    #[test]
    fn blank_preference_fields_do_not_match_everything() {
        let catalog = fixture();
        let source = FixedSource(vec![pref("", "  ")]);

        let enrichment = enrich(&catalog, &source, "u1");
        assert!(enrichment.liked.is_empty());
        assert!(!enrichment.has_boosts());
    }
}
