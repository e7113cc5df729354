//! Thin wrapper around the Twitter/X v1.1 REST API with mention bot defaults.
//!
//! Handles bearer auth and parameter shaping, then delegates to the shared
//! HTTP client. Calls never retry; each response's budget headers are returned
//! with the payload.
use crate::twitter::rate_limit::RateLimitStatus;
use crate::twitter::transport::{ApiResult, TwitterTransport};
use crate::twitter::types::{CursoringIds, RateLimitResponse, User};
use async_trait::async_trait;
use mention_http::{HttpClient, HttpError, RequestOpts};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";

const FOLLOWERS_IDS_PATH: &str = "1.1/followers/ids.json";
const USERS_LOOKUP_PATH: &str = "1.1/users/lookup.json";
const RATE_LIMIT_STATUS_PATH: &str = "1.1/application/rate_limit_status.json";

/// Largest page `followers/ids` serves.
const FOLLOWERS_PAGE_SIZE: &str = "5000";
/// Largest id list `users/lookup` accepts.
pub const MAX_LOOKUP_IDS: usize = 100;

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn new(bearer_token: String) -> Result<Self, HttpError> {
        Self::with_base_url(DEFAULT_BASE_URL, bearer_token)
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(base_url: &str, bearer_token: String) -> Result<Self, HttpError> {
        let base = if base_url.ends_with('/') {
            Cow::Borrowed(base_url)
        } else {
            Cow::Owned(format!("{base_url}/"))
        };
        Ok(Self {
            http: HttpClient::new(&base)?,
            bearer: bearer_token,
        })
    }

    async fn get<T>(
        &self,
        path: &str,
        query: Vec<(&str, Cow<'_, str>)>,
    ) -> Result<ApiResult<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .get_json::<T>(
                path,
                RequestOpts {
                    bearer: Some(&self.bearer),
                    query,
                },
            )
            .await?;

        let rate_limit = RateLimitStatus::from_headers(&resp.headers);
        if rate_limit.is_none() {
            tracing::debug!(path, "response carried no rate-limit headers");
        }
        Ok(ApiResult {
            results: resp.body,
            rate_limit,
        })
    }
}

#[async_trait]
impl TwitterTransport for TwitterApi {
    async fn followers_ids(
        &self,
        user_id: &str,
        cursor: i64,
    ) -> Result<ApiResult<CursoringIds>, HttpError> {
        let query = vec![
            ("user_id", Cow::Borrowed(user_id)),
            ("cursor", cursor.to_string().into()),
            ("count", FOLLOWERS_PAGE_SIZE.into()),
        ];
        self.get(FOLLOWERS_IDS_PATH, query).await
    }

    async fn users_lookup(&self, ids: &[u64]) -> Result<ApiResult<Vec<User>>, HttpError> {
        debug_assert!(ids.len() <= MAX_LOOKUP_IDS);
        let joined = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let query = vec![
            ("user_id", joined.into()),
            ("include_entities", "false".into()),
        ];
        self.get(USERS_LOOKUP_PATH, query).await
    }

    async fn rate_limit_status(
        &self,
        resources: &[&str],
    ) -> Result<ApiResult<RateLimitResponse>, HttpError> {
        let query = vec![("resources", resources.join(",").into())];
        self.get(RATE_LIMIT_STATUS_PATH, query).await
    }
}
