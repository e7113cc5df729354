//! In-memory transport for fetcher and scheduler tests.
use async_trait::async_trait;
use mention_http::HttpError;
use mention_social::twitter::types::{RateLimitResources, format_created_at};
use mention_social::twitter::{
    ApiResult, CursoringIds, RateLimitResponse, RateLimitStatus, Tweet, TwitterTransport, User,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

pub(crate) fn minutes_ago(minutes: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() - time::Duration::minutes(minutes)
}

pub(crate) fn created_at(at: OffsetDateTime) -> String {
    format_created_at(at).expect("format created_at")
}

pub(crate) struct MockTransport {
    pub pages: Vec<Vec<u64>>,
    pub statuses: HashMap<u64, Tweet>,
    /// Budget attached to the n-th lookup call.
    pub budget: fn(usize) -> Option<RateLimitStatus>,
    pub latency: fn(&[u64]) -> Duration,
    pub fail_lookup_call: Option<usize>,
    pub fail_followers: bool,
    pub probe: HashMap<String, RateLimitStatus>,
    pub followers_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    looked_up: Mutex<HashSet<u64>>,
}

impl MockTransport {
    pub fn with_pages(pages: Vec<Vec<u64>>) -> Self {
        Self {
            pages,
            statuses: HashMap::new(),
            budget: |_| None,
            latency: |_| Duration::ZERO,
            fail_lookup_call: None,
            fail_followers: false,
            probe: HashMap::new(),
            followers_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            looked_up: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_followers(ids: Vec<u64>) -> Self {
        Self::with_pages(vec![ids])
    }

    pub fn status(mut self, id: u64, at: OffsetDateTime, text: &str) -> Self {
        self.statuses.insert(
            id,
            Tweet {
                id: id * 10,
                id_str: (id * 10).to_string(),
                created_at: created_at(at),
                text: text.to_string(),
                user: None,
            },
        );
        self
    }

    pub fn status_secs_ago(self, id: u64, secs: i64, text: &str) -> Self {
        let at = OffsetDateTime::now_utc() - time::Duration::seconds(secs);
        self.status(id, at, text)
    }

    pub fn probe(mut self, endpoint: &str, status: RateLimitStatus) -> Self {
        self.probe.insert(endpoint.to_string(), status);
        self
    }

    pub fn looked_up_ids(&self) -> HashSet<u64> {
        self.looked_up.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TwitterTransport for MockTransport {
    async fn followers_ids(
        &self,
        _user_id: &str,
        cursor: i64,
    ) -> Result<ApiResult<CursoringIds>, HttpError> {
        self.followers_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_followers {
            return Err(HttpError::Network("followers unavailable".into()));
        }
        // Page n is served for cursor n; -1 is the first page.
        let page = if cursor < 0 { 0 } else { cursor as usize };
        let ids = self.pages.get(page).cloned().unwrap_or_default();
        let next_cursor = if page + 1 < self.pages.len() {
            (page + 1) as i64
        } else {
            0
        };
        Ok(ApiResult {
            results: CursoringIds {
                ids,
                next_cursor,
                ..Default::default()
            },
            rate_limit: None,
        })
    }

    async fn users_lookup(&self, ids: &[u64]) -> Result<ApiResult<Vec<User>>, HttpError> {
        let call = self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup_call == Some(call) {
            return Err(HttpError::Network(format!("lookup call {call} failed")));
        }
        let latency = (self.latency)(ids);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.looked_up.lock().expect("lock").extend(ids.iter().copied());

        let users = ids
            .iter()
            .map(|id| User {
                id: *id,
                id_str: id.to_string(),
                screen_name: format!("user{id}"),
                name: None,
                status: self.statuses.get(id).cloned().map(Box::new),
            })
            .collect();
        Ok(ApiResult {
            results: users,
            rate_limit: (self.budget)(call),
        })
    }

    async fn rate_limit_status(
        &self,
        _resources: &[&str],
    ) -> Result<ApiResult<RateLimitResponse>, HttpError> {
        Ok(ApiResult {
            results: RateLimitResponse {
                resources: RateLimitResources {
                    users: self.probe.clone(),
                    ..Default::default()
                },
            },
            rate_limit: None,
        })
    }
}
