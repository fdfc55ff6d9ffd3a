//! Error types for the aggregation pipeline.
//!
//! Every failure aborts the whole aggregation. `kind()` and `status_code()`
//! give the HTTP front a stable way to report them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    /// Caller supplied no access or refresh credential
    #[error("Missing tokens")]
    CredentialMissing,

    /// Token endpoint rejected the refresh credential; re-authentication is required
    #[error("Failed to refresh token: {0}")]
    AuthRefresh(String),

    /// Non-auth HTTP failure from the data API
    #[error("Spotify request failed: {status} => {detail}")]
    ExternalFetch { status: u16, detail: String },

    /// Not enough listening history to compute a profile
    #[error("{0}")]
    EmptyResult(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered 2xx with a body we could not interpret
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, InsightsError>;

impl InsightsError {
    pub fn kind(&self) -> &'static str {
        match self {
            InsightsError::CredentialMissing => "CredentialMissing",
            InsightsError::AuthRefresh(_) => "AuthRefreshFailure",
            InsightsError::ExternalFetch { .. }
            | InsightsError::Transport(_)
            | InsightsError::Decode(_) => "ExternalFetchFailure",
            InsightsError::EmptyResult(_) => "EmptyResultFailure",
            InsightsError::Config(_) => "ConfigurationError",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            InsightsError::CredentialMissing => 400,
            InsightsError::AuthRefresh(_) => 401,
            InsightsError::EmptyResult(_) => 422,
            InsightsError::ExternalFetch { .. }
            | InsightsError::Transport(_)
            | InsightsError::Decode(_) => 502,
            InsightsError::Config(_) => 500,
        }
    }
}
