//! Per-endpoint rate-limit budget as reported by the API.
//!
//! Every response carries `x-rate-limit-{limit,remaining,reset}` headers for
//! the bucket of the endpoint that served it. Observations from concurrent
//! calls arrive unordered, so [`RateLimitStatus::merge`] picks a single
//! representative deterministically. Only compare observations taken from the
//! same bucket.
use mention_http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

pub const LIMIT_HEADER: &str = "x-rate-limit-limit";
pub const REMAINING_HEADER: &str = "x-rate-limit-remaining";
pub const RESET_HEADER: &str = "x-rate-limit-reset";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Maximum calls per window.
    pub limit: u32,
    /// Calls left in the current window.
    pub remaining: u32,
    /// Window reset, unix seconds.
    pub reset: i64,
}

impl RateLimitStatus {
    pub fn new(limit: u32, remaining: u32, reset: i64) -> Self {
        Self {
            limit,
            remaining,
            reset,
        }
    }

    /// Keep the tighter of two observations.
    ///
    /// A later reset wins; with equal resets the smaller remaining count wins,
    /// then the smaller ceiling. The key covers every field, so the merge is
    /// commutative and idempotent.
    ///
    /// ```
    /// use mention_social::twitter::RateLimitStatus;
    ///
    /// let a = RateLimitStatus::new(180, 170, 1_000);
    /// let b = RateLimitStatus::new(180, 150, 1_000);
    /// assert_eq!(a.merge(b), b);
    /// assert_eq!(b.merge(a), b);
    /// ```
    pub fn merge(self, other: Self) -> Self {
        if other.tightness() > self.tightness() {
            other
        } else {
            self
        }
    }

    fn tightness(&self) -> (i64, Reverse<u32>, Reverse<u32>) {
        (self.reset, Reverse(self.remaining), Reverse(self.limit))
    }

    /// Calls spent between `prior` and `self`; zero when the budget grew.
    pub fn calls_consumed_since(&self, prior: &Self) -> u32 {
        prior.remaining.saturating_sub(self.remaining)
    }

    /// Seconds until the window resets; negative once it already has.
    pub fn seconds_until_reset(&self, now_unix: i64) -> i64 {
        self.reset - now_unix
    }

    /// Read the budget headers of a single response. All three must be present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }
        Some(Self {
            limit: parse(headers, LIMIT_HEADER)?,
            remaining: parse(headers, REMAINING_HEADER)?,
            reset: parse(headers, RESET_HEADER)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, v.parse().unwrap());
        }
        h
    }

    #[test]
    fn later_reset_wins_even_with_more_remaining() {
        let old = RateLimitStatus::new(180, 3, 1_000);
        let rolled = RateLimitStatus::new(180, 179, 1_900);
        assert_eq!(old.merge(rolled), rolled);
        assert_eq!(rolled.merge(old), rolled);
    }

    #[test]
    fn merge_is_idempotent_and_commutative() {
        let samples = [
            RateLimitStatus::new(180, 170, 1_000),
            RateLimitStatus::new(180, 150, 1_000),
            RateLimitStatus::new(900, 150, 1_000),
            RateLimitStatus::new(180, 175, 1_001),
            RateLimitStatus::default(),
        ];
        for a in samples {
            assert_eq!(a.merge(a), a);
            for b in samples {
                assert_eq!(a.merge(b), b.merge(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn merge_folds_to_tightest() {
        let merged = [
            RateLimitStatus::new(180, 170, 1_000),
            RateLimitStatus::new(180, 160, 1_000),
            RateLimitStatus::new(180, 165, 1_000),
        ]
        .into_iter()
        .reduce(RateLimitStatus::merge)
        .unwrap();
        assert_eq!(merged.remaining, 160);
    }

    #[test]
    fn consumed_calls_clamp_at_zero() {
        let prior = RateLimitStatus::new(180, 100, 1_000);
        assert_eq!(RateLimitStatus::new(180, 90, 1_000).calls_consumed_since(&prior), 10);
        assert_eq!(RateLimitStatus::new(180, 180, 1_900).calls_consumed_since(&prior), 0);
    }

    #[test]
    fn seconds_until_reset_can_go_negative() {
        let rl = RateLimitStatus::new(180, 1, 1_000);
        assert_eq!(rl.seconds_until_reset(100), 900);
        assert_eq!(rl.seconds_until_reset(1_010), -10);
    }

    #[test]
    fn reads_budget_headers() {
        let h = headers(&[
            ("x-rate-limit-limit", "180"),
            ("x-rate-limit-remaining", "165"),
            ("x-rate-limit-reset", "1700000900"),
        ]);
        assert_eq!(
            RateLimitStatus::from_headers(&h),
            Some(RateLimitStatus::new(180, 165, 1_700_000_900))
        );
    }

    #[test]
    fn missing_or_garbled_headers_yield_none() {
        let partial = headers(&[("x-rate-limit-limit", "180")]);
        assert_eq!(RateLimitStatus::from_headers(&partial), None);

        let garbled = headers(&[
            ("x-rate-limit-limit", "180"),
            ("x-rate-limit-remaining", "lots"),
            ("x-rate-limit-reset", "1700000900"),
        ]);
        assert_eq!(RateLimitStatus::from_headers(&garbled), None);
    }
}
