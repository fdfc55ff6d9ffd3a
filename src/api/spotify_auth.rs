use super::basic_auth_header;
use crate::config::Config;
use crate::models::CredentialPair;
use anyhow::{anyhow, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// Manual OAuth helper for obtaining the first credential pair:
/// 1. Build the Spotify authorization URL and print it.
/// 2. User opens it, approves, and is redirected to the redirect URI.
/// 3. User pastes the full redirect URL back; the `code` param is exchanged
///    for an access_token + refresh_token, printed for the browser client.
///
/// Nothing is stored; the caller keeps the tokens.
pub const SCOPES: [&str; 4] = [
    "user-read-private",
    "user-read-email",
    "user-top-read",
    "user-library-read",
];

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn credential_pair(&self) -> Result<CredentialPair> {
        let refresh_token = self
            .refresh_token
            .clone()
            .ok_or_else(|| anyhow!("token response has no refresh_token"))?;
        Ok(CredentialPair {
            access_token: self.access_token.clone(),
            refresh_token,
        })
    }
}

pub fn authorize_url(cfg: &Config) -> Result<Url> {
    if cfg.client_id.is_empty() {
        return Err(anyhow!("no client_id configured"));
    }
    let mut url = Url::parse(&format!("{}/authorize", cfg.auth_base.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("client_id", &cfg.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &cfg.redirect_uri)
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("show_dialog", "true");
    Ok(url)
}

/// Pull the `code` query parameter out of a pasted redirect URL.
pub fn code_from_redirect(redirect_url: &str) -> Result<String> {
    let parsed =
        Url::parse(redirect_url.trim()).map_err(|e| anyhow!("invalid url pasted: {}", e))?;
    if let Some((_, err)) = parsed.query_pairs().find(|(k, _)| k == "error") {
        return Err(anyhow!("authorization denied: {}", err));
    }
    let code = parsed
        .query_pairs()
        .find(|(k, _)| k == "code")
        .ok_or_else(|| anyhow!("no code in redirect URL"))?
        .1
        .into_owned();
    Ok(code)
}

pub async fn exchange_code(client: &Client, cfg: &Config, code: &str) -> Result<TokenResponse> {
    if !cfg.has_client_credentials() {
        return Err(anyhow!("Missing Spotify credentials"));
    }
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", cfg.redirect_uri.as_str()),
    ];
    let url = format!("{}/api/token", cfg.auth_base.trim_end_matches('/'));
    let resp = client
        .post(&url)
        .header(AUTHORIZATION, basic_auth_header(&cfg.client_id, &cfg.client_secret))
        .form(&params)
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        return Err(anyhow!("token exchange failed: {} => {}", status, txt));
    }
    let tr: TokenResponse = resp.json().await?;
    info!("Spotify authorization code exchanged for tokens");
    Ok(tr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_scopes_and_redirect() {
        let cfg = Config {
            client_id: "cid".into(),
            ..Config::default()
        };
        let url = authorize_url(&cfg).unwrap();
        assert!(url.as_str().starts_with("https://accounts.spotify.com/authorize?"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&("scope".into(), SCOPES.join(" "))));
        assert!(pairs.contains(&("redirect_uri".into(), cfg.redirect_uri.clone())));
    }

    #[test]
    fn code_extracted_from_redirect() {
        let code = code_from_redirect("http://127.0.0.1:8787/callback?code=abc123&state=x").unwrap();
        assert_eq!(code, "abc123");
        assert!(code_from_redirect("http://127.0.0.1:8787/callback?error=access_denied").is_err());
        assert!(code_from_redirect("not a url").is_err());
    }
}
