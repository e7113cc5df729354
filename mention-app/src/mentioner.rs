use mention_bot::Mentioner;
use mention_config::MentionerConfig;
use mention_social::twitter::Tweet;

/// Replies to statuses containing any of a set of keywords.
#[derive(Debug, Clone)]
pub struct KeywordMentioner {
    keywords: Vec<String>,
    reply: String,
}

impl KeywordMentioner {
    pub fn new(keywords: impl IntoIterator<Item = String>, reply: impl Into<String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            reply: reply.into(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

impl From<MentionerConfig> for KeywordMentioner {
    fn from(cfg: MentionerConfig) -> Self {
        Self::new(cfg.keywords, cfg.reply)
    }
}

impl Mentioner for KeywordMentioner {
    fn mention(&self, tweet: &Tweet) -> Option<String> {
        if !self.matches(&tweet.text) {
            return None;
        }
        Some(
            self.reply
                .replace("{screen_name}", tweet.screen_name())
                .replace("{text}", &tweet.text),
        )
    }
}
