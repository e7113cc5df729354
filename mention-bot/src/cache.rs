//! Follower id cache.
//!
//! Accounts with very large follower counts would otherwise re-page
//! `followers/ids` every round. The cache keeps the full list for a window and
//! hands out a shuffled, capped prefix per round. It takes `&mut self` and is
//! owned by the fetcher between rounds; lookup workers never touch it.
use rand::seq::SliceRandom;
use std::time::Duration;
use tokio::time::Instant;

/// Window applied when `set` is given a zero TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_MAX_SAMPLE: usize = 1000;

#[derive(Debug)]
pub struct IdsCache {
    ids: Vec<u64>,
    expires: Option<Instant>,
    max_sample: usize,
}

impl Default for IdsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdsCache {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            expires: None,
            max_sample: DEFAULT_MAX_SAMPLE,
        }
    }

    pub fn with_max_sample(mut self, max_sample: usize) -> Self {
        self.max_sample = max_sample.max(1);
        self
    }

    /// Replace the stored ids; they stay readable for `ttl`.
    pub fn set(&mut self, ids: Vec<u64>, ttl: Duration) {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        self.ids = ids;
        self.expires = Some(Instant::now() + ttl);
    }

    pub fn is_expired(&self) -> bool {
        self.expires.is_none_or(|at| Instant::now() > at)
    }

    /// Shuffle the stored ids and return up to `max_sample` of them.
    ///
    /// Empty once the entry expired; callers treat that as a miss.
    pub fn sample(&mut self) -> Vec<u64> {
        if self.is_expired() {
            return Vec::new();
        }
        self.ids.shuffle(&mut rand::thread_rng());
        self.ids.iter().take(self.max_sample).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
