use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Page-size ceiling of `GET /me/top/tracks`.
pub const MAX_TOP_TRACKS_LIMIT: u32 = 50;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Spotify application credentials; env vars take precedence
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_auth_base")]
    pub auth_base: String,
    /// Data API base, including the `/v1` path.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// How many top tracks to request (provider maximum is 50).
    #[serde(default = "default_top_tracks_limit")]
    pub top_tracks_limit: u32,
    /// One of `short_term`, `medium_term`, `long_term`.
    #[serde(default = "default_time_range")]
    pub time_range: String,

    #[serde(default = "default_token_cache_enabled")]
    pub token_cache_enabled: bool,
    #[serde(default = "default_token_cache_ttl")]
    pub token_cache_ttl_secs: i64,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// When set, logs are also written to a daily-rotated file in this directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_auth_base() -> String { "https://accounts.spotify.com".into() }
fn default_api_base() -> String { "https://api.spotify.com/v1".into() }
fn default_listen_addr() -> String { "127.0.0.1:8787".into() }
fn default_top_tracks_limit() -> u32 { 50 }
fn default_time_range() -> String { "medium_term".into() }
fn default_token_cache_enabled() -> bool { true }
fn default_token_cache_ttl() -> i64 { 3500 }
fn default_redirect_uri() -> String { "http://127.0.0.1:8787/callback".into() }

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_base: default_auth_base(),
            api_base: default_api_base(),
            listen_addr: default_listen_addr(),
            top_tracks_limit: default_top_tracks_limit(),
            time_range: default_time_range(),
            token_cache_enabled: default_token_cache_enabled(),
            token_cache_ttl_secs: default_token_cache_ttl(),
            redirect_uri: default_redirect_uri(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let mut cfg: Config = toml::from_str(&s)?;
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults plus environment overrides, used when no config file is given.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay `SPOTIFY_*` environment variables on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var("SPOTIFY_CLIENT_ID") {
            self.client_id = v;
        }
        if let Ok(v) = env::var("SPOTIFY_CLIENT_SECRET") {
            self.client_secret = v;
        }
        if let Ok(v) = env::var("SPOTIFY_AUTH_BASE") {
            self.auth_base = v;
        }
        if let Ok(v) = env::var("SPOTIFY_API_BASE") {
            self.api_base = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.time_range.as_str() {
            "short_term" | "medium_term" | "long_term" => {}
            other => anyhow::bail!("invalid time_range: {}", other),
        }
        if !(1..=MAX_TOP_TRACKS_LIMIT).contains(&self.top_tracks_limit) {
            anyhow::bail!(
                "top_tracks_limit must be between 1 and {}, got {}",
                MAX_TOP_TRACKS_LIMIT,
                self.top_tracks_limit
            );
        }
        if self.token_cache_ttl_secs <= 0 {
            anyhow::bail!("token_cache_ttl_secs must be positive");
        }
        Ok(())
    }

    /// True once both client credentials are present.
    pub fn has_client_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}
