use mention_http::HttpError;

#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Transport or API failure; ends the current round.
    #[error("twitter api error: {0}")]
    Api(#[from] HttpError),

    #[error("invalid created_at timestamp: {0}")]
    Timestamp(#[from] time::error::Parse),

    /// The rate-limit probe did not report the bucket we pace against.
    #[error("rate limit status has no entry for {0}")]
    MissingRateLimit(String),

    #[error("lookup worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
