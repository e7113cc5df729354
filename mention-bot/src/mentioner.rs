use mention_social::twitter::Tweet;

/// Decides whether a follower's status deserves a reaction.
///
/// Returns the action payload (e.g. reply text), or `None` to skip. The
/// scheduler calls it once per fetched status, oldest first.
pub trait Mentioner: Send + Sync {
    fn mention(&self, tweet: &Tweet) -> Option<String>;
}

impl<F> Mentioner for F
where
    F: Fn(&Tweet) -> Option<String> + Send + Sync,
{
    fn mention(&self, tweet: &Tweet) -> Option<String> {
        self(tweet)
    }
}
