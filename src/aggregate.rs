//! Top-tracks taste profile.
//!
//! Three dependent fetches (top tracks, then audio features and artists in
//! parallel) reduced into averaged features and ranked genre counts.

use crate::api::fetch::{ResilientFetcher, Session};
use crate::api::token::TokenRefresher;
use crate::api::token_cache::TokenCache;
use crate::config::Config;
use crate::error::{InsightsError, Result};
use crate::models::{
    AggregateFeatures, ArtistRecord, ArtistsPage, AudioFeaturesPage, CredentialPair,
    FeatureVector, GenreCount, InsightsResponse, TopTracksPage, TrackItem,
};
use crate::response;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Not comparable as taste signals, so never averaged.
pub const EXCLUDED_FEATURES: [&str; 2] = ["duration_ms", "time_signature"];
/// Batch ceiling of `GET /artists`.
pub const MAX_ARTIST_IDS: usize = 50;
/// Batch ceiling of `GET /audio-features`.
pub const MAX_TRACK_IDS: usize = 100;
pub const TOP_GENRES: usize = 5;

/// Result of one aggregation before it is packaged for the caller.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub features: AggregateFeatures,
    pub genres: Vec<GenreCount>,
    /// Latest access credential, rotated or not.
    pub access_token: String,
}

pub struct Aggregator {
    fetcher: ResilientFetcher,
    api_base: String,
    top_tracks_limit: u32,
    time_range: String,
}

impl Aggregator {
    pub fn new(cfg: &Config, cache: Option<Arc<dyn TokenCache>>) -> Self {
        let client = Client::new();
        let refresher = Arc::new(TokenRefresher::new(client.clone(), cfg, cache));
        Self {
            fetcher: ResilientFetcher::new(client, refresher),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            top_tracks_limit: cfg.top_tracks_limit,
            time_range: cfg.time_range.clone(),
        }
    }

    /// Aggregate and package: the credential is included only if it rotated.
    pub async fn insights(&self, creds: &CredentialPair) -> Result<InsightsResponse> {
        let agg = self.aggregate(creds).await?;
        Ok(response::assemble(agg, &creds.access_token))
    }

    pub async fn aggregate(&self, creds: &CredentialPair) -> Result<Aggregate> {
        if creds.access_token.is_empty() || creds.refresh_token.is_empty() {
            return Err(InsightsError::CredentialMissing);
        }
        // a credential minted by an earlier request supersedes the supplied one
        let access = self
            .fetcher
            .refresher()
            .cached(&creds.refresh_token)
            .unwrap_or_else(|| creds.access_token.clone());
        let session = Session::new(&access, &creds.refresh_token);

        let top_url = format!(
            "{}/me/top/tracks?limit={}&time_range={}",
            self.api_base, self.top_tracks_limit, self.time_range
        );
        let tracks = self
            .fetcher
            .get_json::<TopTracksPage>(&session, &top_url)
            .await?
            .body
            .items;
        if tracks.is_empty() {
            return Err(InsightsError::EmptyResult("no tracks".into()));
        }
        debug!("fetched {} top tracks", tracks.len());

        let track_ids: Vec<&str> = tracks
            .iter()
            .map(|t| t.id.as_str())
            .take(MAX_TRACK_IDS)
            .collect();
        let artist_ids = distinct_artist_ids(&tracks);

        let features_url = format!("{}/audio-features?ids={}", self.api_base, track_ids.join(","));
        let artists_url = format!("{}/artists?ids={}", self.api_base, artist_ids.join(","));

        let features_fut = async {
            self.fetcher
                .get_json::<AudioFeaturesPage>(&session, &features_url)
                .await
                .map(|f| f.body.audio_features)
        };
        let artists_fut = async {
            if artist_ids.is_empty() {
                return Ok::<_, InsightsError>(Vec::new());
            }
            self.fetcher
                .get_json::<ArtistsPage>(&session, &artists_url)
                .await
                .map(|f| f.body.artists)
        };
        let (vectors, artists) = futures::future::try_join(features_fut, artists_fut).await?;

        let features = average_features(&vectors)?;
        let genres = rank_genres(&artists);
        info!(
            "aggregated {} tracks, {} artists, {} features, {} genres",
            tracks.len(),
            artist_ids.len(),
            features.len(),
            genres.len()
        );

        Ok(Aggregate {
            features,
            genres,
            access_token: session.access_token().await,
        })
    }
}

/// Distinct artist ids in first-appearance order, capped at [`MAX_ARTIST_IDS`].
pub fn distinct_artist_ids(tracks: &[TrackItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter(|a| seen.insert(a.id.as_str()))
        .take(MAX_ARTIST_IDS)
        .map(|a| a.id.clone())
        .collect()
}

/// Mean of every numeric feature over the non-null vectors.
pub fn average_features(vectors: &[Option<FeatureVector>]) -> Result<AggregateFeatures> {
    let valid: Vec<&FeatureVector> = vectors.iter().flatten().collect();
    if valid.is_empty() {
        return Err(InsightsError::EmptyResult("no valid features".into()));
    }

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for v in &valid {
        for (key, value) in v.iter() {
            if EXCLUDED_FEATURES.contains(&key.as_str()) {
                continue;
            }
            if let Some(n) = value.as_f64() {
                *sums.entry(key.clone()).or_insert(0.0) += n;
            }
        }
    }

    let count = valid.len() as f64;
    for total in sums.values_mut() {
        *total /= count;
    }
    Ok(sums)
}

/// Tally genres across artists; highest count first, ties in first-seen order.
pub fn rank_genres(artists: &[Option<ArtistRecord>]) -> Vec<GenreCount> {
    let mut tally: Vec<GenreCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for genre in artists.iter().flatten().flat_map(|a| a.genres.iter()) {
        match index.get(genre.as_str()) {
            Some(&i) => tally[i].count += 1,
            None => {
                index.insert(genre.as_str(), tally.len());
                tally.push(GenreCount {
                    name: genre.clone(),
                    count: 1,
                });
            }
        }
    }
    // sort_by is stable, which keeps first-seen order among ties
    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally.truncate(TOP_GENRES);
    tally
}
