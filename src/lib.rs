//! Core library for listening-insights
pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod server;

use api::token_cache::{MemoryTokenCache, SystemClock, TokenCache};
use std::sync::Arc;

/// In-memory token cache on the wall clock, or `None` when disabled in config.
pub fn token_cache_from_config(cfg: &config::Config) -> Option<Arc<dyn TokenCache>> {
    if cfg.token_cache_enabled {
        Some(Arc::new(MemoryTokenCache::new(Arc::new(SystemClock))))
    } else {
        None
    }
}
