use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// Source of "now" in epoch seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock that only moves when told to. Used by tests and offline replays.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self { now: AtomicI64::new(start) }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Short-lived access credentials keyed by the refresh credential that minted them.
pub trait TokenCache: Send + Sync {
    fn get(&self, refresh_token: &str) -> Option<String>;
    fn put(&self, refresh_token: &str, access_token: &str, ttl_secs: i64);
    fn invalidate(&self, refresh_token: &str);
}

struct CachedToken {
    access_token: String,
    expires_at: i64, // epoch seconds
}

pub struct MemoryTokenCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl MemoryTokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenCache for MemoryTokenCache {
    fn get(&self, refresh_token: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().ok()?;
        let hit = entries
            .get(refresh_token)
            .map(|c| (c.expires_at > now, c.access_token.clone()));
        match hit {
            Some((true, token)) => Some(token),
            Some((false, _)) => {
                entries.remove(refresh_token);
                None
            }
            None => None,
        }
    }

    fn put(&self, refresh_token: &str, access_token: &str, ttl_secs: i64) {
        if ttl_secs <= 0 {
            return;
        }
        let expires_at = self.clock.now() + ttl_secs;
        if let Ok(mut entries) = self.entries.lock() {
            // drop anything already expired while we hold the lock
            let now = self.clock.now();
            entries.retain(|_, c| c.expires_at > now);
            entries.insert(
                refresh_token.to_string(),
                CachedToken {
                    access_token: access_token.to_string(),
                    expires_at,
                },
            );
        }
    }

    fn invalidate(&self, refresh_token: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(refresh_token);
        }
    }
}
