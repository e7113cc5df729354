use crate::twitter::rate_limit::RateLimitStatus;
use crate::twitter::types::{CursoringIds, RateLimitResponse, User};
use async_trait::async_trait;
use mention_http::HttpError;

/// A decoded payload and the budget headers of the call that produced it.
#[derive(Debug, Clone)]
pub struct ApiResult<T> {
    pub results: T,
    pub rate_limit: Option<RateLimitStatus>,
}

/// The three endpoints the follower fetcher needs.
///
/// Implementations must eventually return from every call; timeouts belong to
/// the transport.
#[async_trait]
pub trait TwitterTransport: Send + Sync {
    /// One page of follower ids. Start with cursor `-1`; a `next_cursor` of 0
    /// marks the last page.
    async fn followers_ids(
        &self,
        user_id: &str,
        cursor: i64,
    ) -> Result<ApiResult<CursoringIds>, HttpError>;

    /// Profiles plus most recent status for up to 100 ids.
    async fn users_lookup(&self, ids: &[u64]) -> Result<ApiResult<Vec<User>>, HttpError>;

    /// Current budgets for the given resource families (e.g. `users`).
    async fn rate_limit_status(
        &self,
        resources: &[&str],
    ) -> Result<ApiResult<RateLimitResponse>, HttpError>;
}
