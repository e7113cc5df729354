//! Follower polling core: watch an account's followers and hand their fresh
//! statuses to a [`Mentioner`].
//!
//! - [`cache`]: time-boxed follower id cache with random sub-sampling
//! - [`fetcher`]: bounded fan-out of `users/lookup` calls and ordered fan-in
//! - [`scheduler`]: the polling loop pacing rounds against the lookup budget
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod mentioner;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::IdsCache;
pub use error::{BotError, Result};
pub use fetcher::{FetchOutcome, FetcherOptions, FollowersFetcher};
pub use mentioner::Mentioner;
pub use scheduler::{Scheduler, SchedulerOptions, SchedulerState};
