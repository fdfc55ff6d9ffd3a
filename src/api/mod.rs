pub mod fetch;
pub mod spotify_auth;
pub mod token;
pub mod token_cache;

use base64::{engine::general_purpose, Engine as _};

/// `Authorization` header value for the token endpoint (client credentials, HTTP Basic).
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}
