//! Twitter/X API integration surface.
//!
//! `client` wraps the shared HTTP client, `transport` is the seam the fetcher
//! depends on, `rate_limit` models the per-call budget headers and `types`
//! holds the v1.1 response models.
pub mod client;
pub mod rate_limit;
pub mod transport;
pub mod types;

pub use client::TwitterApi;
pub use rate_limit::RateLimitStatus;
pub use transport::{ApiResult, TwitterTransport};
pub use types::{CursoringIds, RateLimitResponse, Tweet, User};
