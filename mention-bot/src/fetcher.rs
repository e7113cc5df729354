//! Fan-out/fan-in resolution of follower ids into their latest statuses.
//!
//! Ids are split into `users/lookup`-sized batches. A feeder task pushes the
//! batches into a bounded intake channel that a fixed pool of workers pulls
//! from, so slow lookups never starve the others and concurrency never exceeds
//! the pool size. Workers only produce results; the calling task drains them,
//! merges the budget observations and filters by recency.
//!
//! The first failed batch wins: the round returns that error and a
//! cancellation token stops workers from starting further batches or waiting
//! on a results channel nobody reads. Lookups already in flight run to
//! completion and are discarded.
use crate::cache::{DEFAULT_MAX_SAMPLE, DEFAULT_TTL, IdsCache};
use crate::error::{BotError, Result};
use mention_http::HttpError;
use mention_social::twitter::client::MAX_LOOKUP_IDS;
use mention_social::twitter::{ApiResult, RateLimitStatus, Tweet, TwitterTransport, User};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_BATCH_SIZE: usize = MAX_LOOKUP_IDS;

/// Cursor that requests the first `followers/ids` page.
const FIRST_CURSOR: i64 = -1;

type LookupResult = std::result::Result<ApiResult<Vec<User>>, HttpError>;

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Concurrent `users/lookup` calls per round.
    pub workers: usize,
    /// Ids per lookup, at most 100.
    pub batch_size: usize,
    /// How long a drained follower list is reused.
    pub ids_ttl: Duration,
    /// Ids looked up per round.
    pub sample_size: usize,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            ids_ttl: DEFAULT_TTL,
            sample_size: DEFAULT_MAX_SAMPLE,
        }
    }
}

/// Result of one round.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Fresh statuses, oldest first, each with its author attached.
    pub timeline: Vec<Tweet>,
    /// Tightest lookup budget seen this round; `None` if no lookup reported one.
    pub rate_limit: Option<RateLimitStatus>,
}

pub struct FollowersFetcher {
    transport: Arc<dyn TwitterTransport>,
    cache: IdsCache,
    options: FetcherOptions,
}

impl FollowersFetcher {
    pub fn new(transport: Arc<dyn TwitterTransport>, options: FetcherOptions) -> Self {
        let cache = IdsCache::new().with_max_sample(options.sample_size);
        Self {
            transport,
            cache,
            options,
        }
    }

    /// Statuses posted by `user_id`'s followers strictly after `since`.
    pub async fn fetch_timeline(
        &mut self,
        user_id: &str,
        since: OffsetDateTime,
    ) -> Result<FetchOutcome> {
        let ids = self.follower_ids(user_id).await?;
        let batches = partition(&ids, self.options.batch_size);
        tracing::debug!(ids = ids.len(), batches = batches.len(), "looking up followers");

        let cancel = CancellationToken::new();
        let _cancel_on_return = cancel.clone().drop_guard();
        let (mut results, workers) = self.spawn_workers(batches, cancel);

        let mut timeline = Vec::new();
        let mut rate_limit: Option<RateLimitStatus> = None;
        while let Some(result) = results.recv().await {
            let ApiResult {
                results: users,
                rate_limit: observed,
            } = result?;
            if let Some(observed) = observed {
                rate_limit = Some(match rate_limit {
                    Some(current) => current.merge(observed),
                    None => observed,
                });
            }
            collect_recent(users, since, &mut timeline)?;
        }

        for worker in workers {
            worker
                .await
                .map_err(|e| BotError::Worker(e.to_string()))?;
        }

        sort_timeline(&mut timeline);
        Ok(FetchOutcome {
            timeline,
            rate_limit,
        })
    }

    /// Cached sample of follower ids, re-paging the full list on a miss.
    async fn follower_ids(&mut self, user_id: &str) -> Result<Vec<u64>> {
        let sampled = self.cache.sample();
        if !sampled.is_empty() {
            return Ok(sampled);
        }

        let ids = self.drain_follower_ids(user_id).await?;
        tracing::debug!(user_id, followers = ids.len(), "follower ids refreshed");
        self.cache.set(ids, self.options.ids_ttl);
        Ok(self.cache.sample())
    }

    async fn drain_follower_ids(&self, user_id: &str) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        let mut cursor = FIRST_CURSOR;
        loop {
            let page = self.transport.followers_ids(user_id, cursor).await?.results;
            ids.extend_from_slice(&page.ids);
            if page.is_last_page() {
                return Ok(ids);
            }
            cursor = page.next_cursor;
        }
    }

    fn spawn_workers(
        &self,
        batches: Vec<Vec<u64>>,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<LookupResult>, Vec<JoinHandle<()>>) {
        let pool = self.options.workers.max(1);
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<u64>>(1);
        let batch_rx = Arc::new(Mutex::new(batch_rx));
        let (result_tx, result_rx) = mpsc::channel::<LookupResult>(1);

        let feeder_cancel = cancel.clone();
        tokio::spawn(async move {
            for batch in batches {
                tokio::select! {
                    biased;
                    _ = feeder_cancel.cancelled() => break,
                    sent = batch_tx.send(batch) => if sent.is_err() { break },
                }
            }
        });

        let mut workers = Vec::with_capacity(pool);
        for worker in 0..pool {
            let transport = Arc::clone(&self.transport);
            let batch_rx = Arc::clone(&batch_rx);
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            workers.push(tokio::spawn(async move {
                let mut looked_up = 0usize;
                loop {
                    let batch = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        next = async { batch_rx.lock().await.recv().await } => match next {
                            Some(batch) => batch,
                            None => break,
                        },
                    };
                    let result = transport.users_lookup(&batch).await;
                    looked_up += 1;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = result_tx.send(result) => if sent.is_err() { break },
                    }
                }
                tracing::trace!(worker, looked_up, "lookup worker done");
            }));
        }
        // Workers hold the only senders: the channel closes once they all exit.
        drop(result_tx);

        (result_rx, workers)
    }
}

/// Contiguous, order-preserving batches of at most `batch_size` ids.
pub fn partition(ids: &[u64], batch_size: usize) -> Vec<Vec<u64>> {
    ids.chunks(batch_size.clamp(1, MAX_LOOKUP_IDS))
        .map(<[u64]>::to_vec)
        .collect()
}

fn collect_recent(users: Vec<User>, since: OffsetDateTime, timeline: &mut Vec<Tweet>) -> Result<()> {
    for mut user in users {
        let Some(status) = user.status.take() else {
            continue;
        };
        let mut tweet = *status;
        if tweet.created_at_time()? > since {
            tweet.user = Some(user);
            timeline.push(tweet);
        }
    }
    Ok(())
}

/// Stable ascending sort; unparsable timestamps sort first instead of failing.
fn sort_timeline(timeline: &mut [Tweet]) {
    timeline.sort_by_key(|tweet| tweet.created_at_time().ok());
}
