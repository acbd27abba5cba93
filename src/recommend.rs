//! Request pipeline: one JSON object in, one JSON object out.
//!
//! The flow per request: score sentiment → map mood → fresh cluster
//! assignment → optional enrichment → mode decision → selection → strip
//! scratch state. Enrichment failures are absorbed before they reach this
//! level; anything else bubbles up so the caller can emit the single
//! `{"error": ...}` object.

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Track};
use crate::enrich::{self, Enrichment, PreferenceSource};
use crate::mood;
use crate::selector::{self, SelectionMode};
use crate::sentiment::SentimentScorer;

/// Default playlist length.
pub const DEFAULT_NUM_SONGS: usize = 10;

/// The recognized request fields. Unknown fields are ignored; a missing
/// `mood` is tolerated and treated as empty (neutral).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub num_songs: Option<usize>,
}

/// One recommended track: original audio attributes only, in selection
/// order. No scoring scratch ever leaks into this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedTrack {
    pub track_name: String,
    pub artist_name: String,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub tempo: f64,
}

impl From<&Track> for RecommendedTrack {
    fn from(track: &Track) -> Self {
        Self {
            track_name: track.track_name.clone(),
            artist_name: track.artist_name.clone(),
            valence: track.valence,
            energy: track.energy,
            danceability: track.danceability,
            acousticness: track.acousticness,
            tempo: track.tempo,
        }
    }
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub sentiment_score: f64,
    pub recommendations: Vec<RecommendedTrack>,
}

/// Run one recommendation request end to end.
///
/// `preferences` is the optional external preference store; it is only
/// consulted when the request names a user. The scorer is only consulted for
/// non-empty mood text; empty input is neutral by definition, with no
/// collaborator round trip.
pub fn handle_request(
    catalog: &Catalog,
    scorer: &dyn SentimentScorer,
    preferences: Option<&dyn PreferenceSource>,
    request: &RecommendRequest,
) -> Result<RecommendResponse> {
    let sentiment_score = if request.mood.trim().is_empty() {
        debug!("Empty mood text, defaulting to neutral sentiment");
        0.0
    } else {
        scorer.score(&request.mood)?
    };

    let target = mood::map_sentiment(sentiment_score);
    let num_songs = request.num_songs.unwrap_or(DEFAULT_NUM_SONGS);
    info!(
        "Sentiment {sentiment_score:.3} -> cluster {}, valence {:.2}..{:.2}, {} song(s)",
        target.cluster, target.start_valence, target.end_valence, num_songs
    );

    // Fresh per-request cluster assignment; the fitted centroids never move,
    // so this is stable, but the copy is ours alone to consume.
    let clusters = catalog.assign_clusters();

    let enrichment = match (&request.user_id, preferences) {
        (Some(user_id), Some(source)) => enrich::enrich(catalog, source, user_id),
        _ => Enrichment::unenriched(catalog.len()),
    };
    let mode = decide_mode(catalog, enrichment);

    let picked = selector::select(catalog, &clusters, &target, num_songs, &mode);
    let recommendations = picked.into_iter().map(RecommendedTrack::from).collect();

    Ok(RecommendResponse {
        sentiment_score,
        recommendations,
    })
}

/// Pick the selection mode once, from the personalization inputs that exist:
/// liked-track vectors beat scalar boosts beat the plain trajectory walk.
fn decide_mode(catalog: &Catalog, enrichment: Enrichment) -> SelectionMode {
    if let Some(user_mean) = selector::user_mean(catalog, &enrichment.liked) {
        debug!("Selection mode: similarity ({} liked tracks)", enrichment.liked.len());
        SelectionMode::SimilarityScored { user_mean }
    } else if enrichment.has_boosts() {
        debug!("Selection mode: boost-only");
        SelectionMode::BoostScored {
            boosts: enrichment.boosts,
        }
    } else {
        debug!("Selection mode: trajectory walk");
        SelectionMode::TrajectoryWalk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::PreferenceTrack;
    use crate::sentiment::FixedScorer;
    use anyhow::anyhow;

    struct UnreachableSource;

    impl PreferenceSource for UnreachableSource {
        fn fetch_preferences(&self, _user_id: &str) -> Result<Vec<PreferenceTrack>> {
            Err(anyhow!("connection refused"))
        }
    }

    struct FailingScorer;

    impl SentimentScorer for FailingScorer {
        fn score(&self, _text: &str) -> Result<f64> {
            Err(anyhow!("scorer unavailable"))
        }
    }

    fn track(name: &str, valence: f64) -> Track {
        Track {
            track_name: name.to_string(),
            artist_name: "Artist".to_string(),
            valence,
            energy: valence,
            danceability: 0.5,
            acousticness: 0.5,
            tempo: 100.0 + valence * 80.0,
            popularity: 50,
        }
    }

    fn fixture() -> Catalog {
        let tracks: Vec<Track> = (0..24)
            .map(|i| track(&format!("t{i:02}"), f64::from(i) / 23.0))
            .collect();
        Catalog::build(tracks).expect("fixture catalog should build")
    }

    #[test]
    fn empty_mood_is_neutral_without_calling_the_scorer() {
        let catalog = fixture();
        let request = RecommendRequest {
            mood: "   ".to_string(),
            ..Default::default()
        };

        // A failing scorer proves the collaborator is never invoked.
        let response =
            handle_request(&catalog, &FailingScorer, None, &request).expect("request should succeed");
        assert_eq!(response.sentiment_score, 0.0);
    }

    #[test]
    fn scorer_failure_surfaces_as_request_error() {
        let catalog = fixture();
        let request = RecommendRequest {
            mood: "pretty gloomy out".to_string(),
            ..Default::default()
        };
        assert!(handle_request(&catalog, &FailingScorer, None, &request).is_err());
    }

    #[test]
    fn recommendations_are_distinct_and_capped() {
        let catalog = fixture();
        let request = RecommendRequest {
            mood: "fine".to_string(),
            num_songs: Some(5),
            ..Default::default()
        };

        let response = handle_request(&catalog, &FixedScorer(0.5), None, &request)
            .expect("request should succeed");
        assert!(response.recommendations.len() <= 5);
        let mut keys: Vec<_> = response
            .recommendations
            .iter()
            .map(|r| (r.track_name.clone(), r.artist_name.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), response.recommendations.len());
    }

    #[test]
    fn unreachable_preference_store_still_yields_recommendations() {
        let catalog = fixture();
        let request = RecommendRequest {
            mood: "okay I guess".to_string(),
            user_id: Some("u1".to_string()),
            ..Default::default()
        };

        let response = handle_request(
            &catalog,
            &FixedScorer(0.0),
            Some(&UnreachableSource),
            &request,
        )
        .expect("enrichment failure must not surface");
        assert_eq!(response.sentiment_score, 0.0);
        // Degraded to Mode A; the response shape is still valid.
        assert!(response.recommendations.len() <= DEFAULT_NUM_SONGS);
    }

    #[test]
    fn missing_user_skips_enrichment_entirely() {
        let catalog = fixture();
        let request = RecommendRequest {
            mood: "great!".to_string(),
            ..Default::default()
        };
        // No preference source at all; must behave exactly like Mode A.
        let response = handle_request(&catalog, &FixedScorer(0.9), None, &request)
            .expect("request should succeed");
        assert_eq!(response.sentiment_score, 0.9);
    }

    #[test]
    fn response_serializes_without_scratch_fields() {
        let catalog = fixture();
        let request = RecommendRequest {
            mood: String::new(),
            ..Default::default()
        };
        let response = handle_request(&catalog, &FixedScorer(0.0), None, &request)
            .expect("request should succeed");

        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("sentiment_score").is_some());
        let recs = json["recommendations"].as_array().expect("array");
        for rec in recs {
            let obj = rec.as_object().expect("object");
            assert_eq!(obj.len(), 7, "only the original track attributes");
            assert!(obj.contains_key("track_name"));
            assert!(obj.contains_key("tempo"));
            assert!(!obj.contains_key("popularity"));
            assert!(!obj.contains_key("cluster"));
        }
    }

    #[test]
    fn request_tolerates_missing_fields() {
        let request: RecommendRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(request.mood, "");
        assert!(request.user_id.is_none());
        assert!(request.num_songs.is_none());
    }
}
