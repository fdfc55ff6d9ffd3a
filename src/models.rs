use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Access + refresh credential as supplied by the browser client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialPair {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    pub id: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracksPage {
    #[serde(default)]
    pub items: Vec<TrackItem>,
}

/// Raw per-track feature object. Non-numeric fields (id, uri, type, ...) are
/// kept here and filtered during reduction.
pub type FeatureVector = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Deserialize)]
pub struct AudioFeaturesPage {
    #[serde(default)]
    pub audio_features: Vec<Option<FeatureVector>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRecord {
    pub id: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistsPage {
    #[serde(default)]
    pub artists: Vec<Option<ArtistRecord>>,
}

/// Mean of each numeric feature across tracks, keyed by feature name.
pub type AggregateFeatures = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    pub name: String,
    pub count: u32,
}

/// Outward payload of one aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub features: AggregateFeatures,
    pub genres: Vec<GenreCount>,
    /// Present only when the access credential was rotated during the request.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub access_token: Option<String>,
}
