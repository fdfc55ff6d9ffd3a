use super::basic_auth_header;
use super::token_cache::TokenCache;
use crate::config::Config;
use crate::error::{InsightsError, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

/// Seconds shaved off the provider's `expires_in` before caching.
const EXPIRY_MARGIN_SECS: i64 = 100;

/// Mints access credentials from a refresh credential against the Spotify
/// accounts service.
pub struct TokenRefresher {
    client: Client,
    auth_base: String,
    client_id: String,
    client_secret: String,
    cache: Option<Arc<dyn TokenCache>>,
    cache_ttl_secs: i64,
}

impl TokenRefresher {
    pub fn new(client: Client, cfg: &Config, cache: Option<Arc<dyn TokenCache>>) -> Self {
        Self {
            client,
            auth_base: cfg.auth_base.trim_end_matches('/').to_string(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            cache,
            cache_ttl_secs: cfg.token_cache_ttl_secs,
        }
    }

    /// Cached access credential for this refresh credential, if still fresh.
    pub fn cached(&self, refresh_token: &str) -> Option<String> {
        self.cache.as_ref().and_then(|c| c.get(refresh_token))
    }

    /// Return a usable access credential for `refresh_token`.
    ///
    /// `rejected` is the credential the data API just refused; a cache hit
    /// equal to it is discarded and a real refresh is performed.
    pub async fn refresh(&self, refresh_token: &str, rejected: Option<&str>) -> Result<String> {
        if refresh_token.is_empty() {
            return Err(InsightsError::CredentialMissing);
        }
        if let Some(cache) = &self.cache {
            match cache.get(refresh_token) {
                Some(t) if Some(t.as_str()) != rejected => {
                    debug!("Using cached access token");
                    return Ok(t);
                }
                Some(_) => cache.invalidate(refresh_token),
                None => {}
            }
        }
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(InsightsError::Config(
                "missing Spotify client credentials".into(),
            ));
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let url = format!("{}/api/token", self.auth_base);
        let resp = self
            .client
            .post(&url)
            .header(
                AUTHORIZATION,
                basic_auth_header(&self.client_id, &self.client_secret),
            )
            .form(&params)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InsightsError::AuthRefresh(format!("{} - {}", status, body)));
        }
        // a broken read on a 2xx is a transport failure, not a rejected credential
        let body = resp.text().await?;
        let j: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| InsightsError::AuthRefresh(format!("unreadable token response: {}", e)))?;
        let access_token = j["access_token"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| InsightsError::AuthRefresh("no access_token in response".into()))?
            .to_string();
        let expires_in = j["expires_in"].as_i64().unwrap_or(3600);

        if let Some(cache) = &self.cache {
            let ttl = self.cache_ttl_secs.min(expires_in.saturating_sub(EXPIRY_MARGIN_SECS));
            cache.put(refresh_token, &access_token, ttl);
        }
        info!("Spotify access token refreshed (expires in {}s)", expires_in);
        Ok(access_token)
    }
}
