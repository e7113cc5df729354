use anyhow::{Context, Result};
use clap::Parser;
use mention_bot::{FetcherOptions, Scheduler, SchedulerOptions};
use mention_common::observability::{LogConfig, LogFormat, init_logging};
use mention_config::{LoggingConfig, MentionConfig, MentionConfigLoader, PollerConfig};
use mention_social::twitter::TwitterApi;
use mentioner::KeywordMentioner;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
mod mentioner;

/// Watch an account's followers and react to their fresh statuses.
#[derive(Debug, Parser)]
#[command(name = "mentionbot", version)]
struct Cli {
    /// Configuration file (YAML/TOML/JSON).
    #[arg(long, env = "MENTION_CONFIG", default_value = "mention.yaml")]
    config: PathBuf,

    /// Log at debug level and mirror logs to stderr.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: MentionConfig = MentionConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let log_path = init_logging(log_config(&cfg.logging, cli.debug)?)?;
    tracing::info!(log = %log_path.display(), "mentionbot starting");

    let api = TwitterApi::with_base_url(&cfg.twitter.base_url, cfg.twitter.auth_token.clone())?;
    let mut scheduler = Scheduler::new(
        Arc::new(api),
        cfg.account.user_id.clone(),
        scheduler_options(&cfg.poller),
    );
    match cfg.mentioner {
        Some(m) => scheduler = scheduler.with_mentioner(Arc::new(KeywordMentioner::from(m))),
        None => tracing::warn!("no mentioner configured; statuses are fetched but ignored"),
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, stopping after this round");
            }
            shutdown.cancel();
        });
    }

    scheduler.run(shutdown).await?;
    tracing::info!("mentionbot stopped");
    Ok(())
}

fn log_config(logging: &LoggingConfig, debug: bool) -> Result<LogConfig> {
    let format: LogFormat = logging.format.parse().map_err(anyhow::Error::msg)?;
    Ok(LogConfig {
        log_dir: logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: debug || logging.emit_stderr,
        format,
        default_filter: if debug { "debug".into() } else { logging.filter.clone() },
        ..LogConfig::default()
    })
}

fn scheduler_options(poller: &PollerConfig) -> SchedulerOptions {
    SchedulerOptions {
        min_wait: Duration::from_secs(poller.min_wait_secs),
        lookback: Duration::from_secs(poller.lookback_secs),
        fetcher: FetcherOptions {
            workers: poller.workers,
            batch_size: poller.batch_size,
            ids_ttl: Duration::from_secs(poller.ids_ttl_secs),
            sample_size: poller.sample_size,
        },
    }
}
