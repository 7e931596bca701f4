use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Every this many writes, drop all expired entries.
const SWEEP_EVERY: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process stand-in for the redis session cache. Entries expire lazily
/// on read, against the injected clock, and are swept periodically on write.
pub struct MemorySessionCache {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
    prefix: String,
    clock: Arc<dyn Clock>,
}

impl MemorySessionCache {
    pub fn new(prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        MemorySessionCache {
            entries: DashMap::new(),
            writes: AtomicUsize::new(0),
            prefix: prefix.into(),
            clock,
        }
    }

    fn put(&self, key: String, value: String, ttl_secs: u64) {
        let now = self.clock.now();
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(key, Entry { value, expires_at });

        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }
    }

    fn sweep(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    fn live(&self, key: &str) -> Option<Entry> {
        let now = self.clock.now();
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn remaining_secs(&self, key: &str) -> Option<u64> {
        let entry = self.live(key)?;
        let secs = (entry.expires_at - self.clock.now()).num_seconds();
        Some(secs.max(0) as u64)
    }

    /// Remaining lifetime of a revocation entry, if the token is revoked.
    pub fn blacklist_ttl_secs(&self, token: &str) -> Option<u64> {
        self.remaining_secs(&blacklist_key(&self.prefix, token))
    }

    /// Remaining lifetime of a user's refresh-token id slot.
    pub fn refresh_id_ttl_secs(&self, user_id: UserId) -> Option<u64> {
        self.remaining_secs(&refresh_slot_key(&self.prefix, user_id))
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        self.sweep(self.clock.now());
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SessionCache for MemorySessionCache {
    async fn put_refresh_id(
        &self,
        user_id: UserId,
        token_id: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        self.put(
            refresh_slot_key(&self.prefix, user_id),
            token_id.to_string(),
            ttl_secs,
        );
        Ok(())
    }

    async fn get_refresh_id(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        Ok(self
            .live(&refresh_slot_key(&self.prefix, user_id))
            .map(|entry| entry.value))
    }

    async fn delete_refresh_id(&self, user_id: UserId) -> Result<(), AuthError> {
        self.entries.remove(&refresh_slot_key(&self.prefix, user_id));
        Ok(())
    }

    async fn blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), AuthError> {
        self.put(blacklist_key(&self.prefix, token), "1".to_string(), ttl_secs);
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.live(&blacklist_key(&self.prefix, token)).is_some())
    }
}
