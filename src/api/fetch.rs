use super::token::TokenRefresher;
use crate::error::{InsightsError, Result};
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Credentials for one aggregation request.
///
/// The current access credential is shared by every fetch of the request so a
/// rotation done by one fetch is picked up by the next.
pub struct Session {
    refresh_token: String,
    access: tokio::sync::Mutex<String>,
}

impl Session {
    pub fn new(access_token: &str, refresh_token: &str) -> Self {
        Self {
            refresh_token: refresh_token.to_string(),
            access: tokio::sync::Mutex::new(access_token.to_string()),
        }
    }

    pub async fn access_token(&self) -> String {
        self.access.lock().await.clone()
    }

    /// Replace `rejected` with a fresh credential. If another fetch already
    /// rotated it, that credential is reused without a second refresh.
    async fn renew(&self, refresher: &TokenRefresher, rejected: &str) -> Result<String> {
        let mut current = self.access.lock().await;
        if current.as_str() != rejected {
            debug!("access token already rotated by a concurrent fetch");
            return Ok(current.clone());
        }
        let fresh = refresher.refresh(&self.refresh_token, Some(rejected)).await?;
        *current = fresh.clone();
        Ok(fresh)
    }
}

/// Parsed body plus the credential minted while fetching it, if any.
#[derive(Debug)]
pub struct Fetched<T> {
    pub body: T,
    pub refreshed: Option<String>,
}

/// GET against the data API with a single refresh-and-retry on 401/403.
pub struct ResilientFetcher {
    client: Client,
    refresher: Arc<TokenRefresher>,
}

impl ResilientFetcher {
    pub fn new(client: Client, refresher: Arc<TokenRefresher>) -> Self {
        Self { client, refresher }
    }

    pub fn refresher(&self) -> &TokenRefresher {
        &self.refresher
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        url: &str,
    ) -> Result<Fetched<T>> {
        let token = session.access_token().await;
        let resp = self.send(url, &token).await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Got {} from {}; refreshing token and retrying once", status, url);
            let fresh = session.renew(&self.refresher, &token).await?;
            let resp2 = self.send(url, &fresh).await?;
            let body = Self::read_body(resp2).await?;
            return Ok(Fetched {
                body,
                refreshed: Some(fresh),
            });
        }

        let body = Self::read_body(resp).await?;
        Ok(Fetched {
            body,
            refreshed: None,
        })
    }

    async fn send(&self, url: &str, access_token: &str) -> Result<Response> {
        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(resp)
    }

    async fn read_body<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(InsightsError::ExternalFetch {
                status: status.as_u16(),
                detail: txt,
            });
        }
        let txt = resp.text().await?;
        serde_json::from_str(&txt).map_err(|e| InsightsError::Decode(e.to_string()))
    }
}
