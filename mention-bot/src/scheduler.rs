//! Adaptive polling loop.
//!
//! Each round fetches fresh follower statuses, hands them to the mentioner in
//! order, advances the watermark and sleeps. The sleep stretches the remaining
//! `users/lookup` budget over the time left until the window resets, based on
//! how many calls the last round consumed, and never drops below a floor.
use crate::error::{BotError, Result};
use crate::fetcher::{FetcherOptions, FollowersFetcher};
use crate::mentioner::Mentioner;
use mention_social::twitter::{RateLimitStatus, Tweet, TwitterTransport};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(10);
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(15 * 60);

/// Resource family probed at start-up.
pub const LOOKUP_RESOURCE: &str = "users";
/// Bucket the loop paces against; the fetcher's observations come from it too.
pub const LOOKUP_ENDPOINT: &str = "/users/lookup";

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Shortest sleep between rounds.
    pub min_wait: Duration,
    /// How far back the first round looks.
    pub lookback: Duration,
    pub fetcher: FetcherOptions,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            min_wait: DEFAULT_MIN_WAIT,
            lookback: DEFAULT_LOOKBACK,
            fetcher: FetcherOptions::default(),
        }
    }
}

/// State carried from one round to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerState {
    /// Statuses at or before this instant were already handled.
    pub last_seen_created_at: OffsetDateTime,
    pub last_rate_limit: RateLimitStatus,
}

pub struct Scheduler {
    user_id: String,
    transport: Arc<dyn TwitterTransport>,
    fetcher: FollowersFetcher,
    mentioner: Option<Arc<dyn Mentioner>>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(
        transport: Arc<dyn TwitterTransport>,
        user_id: impl Into<String>,
        options: SchedulerOptions,
    ) -> Self {
        let fetcher = FollowersFetcher::new(Arc::clone(&transport), options.fetcher.clone());
        Self {
            user_id: user_id.into(),
            transport,
            fetcher,
            mentioner: None,
            options,
        }
    }

    pub fn with_mentioner(mut self, mentioner: Arc<dyn Mentioner>) -> Self {
        self.mentioner = Some(mentioner);
        self
    }

    /// Seed the loop state from the rate-limit probe.
    pub async fn init_state(&self, now: OffsetDateTime) -> Result<SchedulerState> {
        let probe = self.transport.rate_limit_status(&[LOOKUP_RESOURCE]).await?;
        let last_rate_limit = probe
            .results
            .resources
            .users
            .get(LOOKUP_ENDPOINT)
            .copied()
            .ok_or_else(|| BotError::MissingRateLimit(LOOKUP_ENDPOINT.to_string()))?;
        Ok(SchedulerState {
            last_seen_created_at: now - self.options.lookback,
            last_rate_limit,
        })
    }

    /// Run one round and return how long to sleep before the next.
    pub async fn run_iteration(&mut self, state: &mut SchedulerState) -> Result<Duration> {
        let outcome = self
            .fetcher
            .fetch_timeline(&self.user_id, state.last_seen_created_at)
            .await?;
        tracing::debug!("{} tweets fetched", outcome.timeline.len());

        for tweet in &outcome.timeline {
            self.dispatch(tweet)?;
        }

        if let Some(latest) = outcome.timeline.last() {
            state.last_seen_created_at = latest.created_at_time()?;
        }

        let wait = match outcome.rate_limit {
            Some(current) => {
                tracing::debug!(
                    "rate limit: ({} -> {}) / {}",
                    state.last_rate_limit.remaining,
                    current.remaining,
                    current.limit
                );
                let now = OffsetDateTime::now_utc().unix_timestamp();
                let wait = compute_wait(&state.last_rate_limit, &current, now, self.options.min_wait);
                state.last_rate_limit = current;
                wait
            }
            None => self.options.min_wait,
        };
        Ok(wait)
    }

    /// Hand one status to the mentioner and log its decision. Returns the
    /// decision; `None` and empty payloads both mean the status was skipped.
    fn dispatch(&self, tweet: &Tweet) -> Result<Option<String>> {
        let created_at = tweet.created_at_time()?;
        let Some(mentioner) = &self.mentioner else {
            return Ok(None);
        };
        let Some(action) = mentioner.mention(tweet).filter(|a| !a.is_empty()) else {
            return Ok(None);
        };
        tracing::debug!(
            "({})[{}] @{}: {}",
            tweet.id_str,
            created_at,
            tweet.screen_name(),
            tweet.text
        );
        tracing::info!(tweet_id = %tweet.id_str, screen_name = tweet.screen_name(), "{action}");
        Ok(Some(action))
    }

    /// Poll until an error ends the loop or `shutdown` fires between rounds.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        let mut state = self.init_state(OffsetDateTime::now_utc()).await?;
        tracing::info!(
            user_id = %self.user_id,
            remaining = state.last_rate_limit.remaining,
            limit = state.last_rate_limit.limit,
            "polling followers"
        );

        loop {
            if shutdown.is_cancelled() {
                return Ok(());
            }
            let wait = self.run_iteration(&mut state).await?;
            tracing::debug!("wait {} seconds for next loop", wait.as_secs());
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

/// Sleep needed to spread `current.remaining` calls over the rest of the window.
///
/// With `diff` calls spent since `prior`, roughly `remaining / diff` more
/// rounds fit before reset. No consumption (or a grown budget) means no
/// urgency and the floor applies.
///
/// ```
/// use mention_bot::scheduler::compute_wait;
/// use mention_social::twitter::RateLimitStatus;
/// use std::time::Duration;
///
/// let prior = RateLimitStatus::new(180, 180, 0);
/// let current = RateLimitStatus::new(180, 165, 900);
/// let wait = compute_wait(&prior, &current, 0, Duration::from_secs(10));
/// assert_eq!(wait, Duration::from_secs(81));
/// ```
pub fn compute_wait(
    prior: &RateLimitStatus,
    current: &RateLimitStatus,
    now_unix: i64,
    floor: Duration,
) -> Duration {
    let diff = current.calls_consumed_since(prior);
    if diff == 0 {
        return floor;
    }
    let rounds = i64::from((current.remaining / diff).max(1));
    let wait = current.seconds_until_reset(now_unix) / rounds;
    if wait <= 0 {
        return floor;
    }
    Duration::from_secs(wait as u64).max(floor)
}
