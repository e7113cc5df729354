//! Social network clients used by the mention bot.
//!
//! Only the Twitter/X v1.1 surface needed to watch followers is implemented:
//! follower id pagination, bulk user lookup and the rate-limit status probe.
pub mod twitter;
