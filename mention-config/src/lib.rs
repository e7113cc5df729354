//! Loader for the bot configuration: YAML files, inline snippets and
//! `MENTION_`-prefixed environment overrides (`MENTION_TWITTER__AUTH_TOKEN`).
//!
//! String values may reference the environment as `${VAR}`; references are
//! expanded recursively up to a fixed depth after all sources are merged.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "MENTION";

#[derive(Debug, Deserialize)]
pub struct MentionConfig {
    pub version: Option<String>,
    pub account: AccountConfig,
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub mentioner: Option<MentionerConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The account whose followers are watched.
#[derive(Debug, Deserialize)]
pub struct AccountConfig {
    /// Accepts `"12345"` as well as a bare `12345`.
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    pub auth_token: String,
    #[serde(default = "default_twitter_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub workers: usize,
    pub batch_size: usize,
    pub sample_size: usize,
    pub ids_ttl_secs: u64,
    pub min_wait_secs: u64,
    pub lookback_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            batch_size: 100,
            sample_size: 1000,
            ids_ttl_secs: 15 * 60,
            min_wait_secs: 10,
            lookback_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MentionerConfig {
    pub keywords: Vec<String>,
    /// Reply template; `{screen_name}` and `{text}` are substituted.
    pub reply: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
            emit_stderr: false,
            filter: "info".into(),
            dir: None,
        }
    }
}

fn default_twitter_base_url() -> String {
    "https://api.twitter.com/".into()
}

/// Numeric ids arrive as numbers from unquoted YAML and from parsed env vars.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate wiring.
pub struct MentionConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env: Environment,
}

impl Default for MentionConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MentionConfigLoader {
    /// Start with `MENTION_` env overrides; files and snippets are added on top
    /// and the environment is applied last. Env values that look like numbers
    /// or booleans are typed as such, so `MENTION_POLLER__WORKERS=3` works.
    ///
    /// ```
    /// use mention_config::MentionConfigLoader;
    ///
    /// let cfg = MentionConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// account: { user_id: "42" }
    /// twitter: { auth_token: "t" }
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.account.user_id, "42");
    /// assert_eq!(cfg.poller.workers, 5);
    /// assert!(cfg.mentioner.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env: Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        }
    }

    /// Attach a YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but a missing file is skipped, so
    /// deployments can rely on the environment alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` references and deserialize.
    ///
    /// ```
    /// use mention_config::MentionConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_BEARER", "from-env"); }
    /// let cfg = MentionConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// account: { user_id: "7" }
    /// twitter: { auth_token: "${DOC_BEARER}" }
    /// mentioner: { keywords: ["rust"], reply: "@{screen_name} hi" }
    /// "#)
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(cfg.twitter.auth_token, "from-env");
    /// assert_eq!(cfg.twitter.base_url, "https://api.twitter.com/");
    /// assert_eq!(cfg.mentioner.unwrap().keywords, vec!["rust"]);
    /// unsafe { std::env::remove_var("DOC_BEARER"); }
    /// ```
    pub fn load(self) -> Result<MentionConfig, ConfigError> {
        let cfg = self.builder.add_source(self.env).build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
