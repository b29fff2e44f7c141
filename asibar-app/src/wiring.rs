//! Turns a validated [`AppConfig`] into the fetcher and publisher the run needs.
use asibar_config::AppConfig;
use asibar_scrape::StatusFetcher;
use asibar_social::twitter::{TwitterApi, TwitterCredentials};
use asibar_social::{PostOptions, PostReceipt, Poster, PublishError, Publisher};
use async_trait::async_trait;
use std::time::Duration;

pub type DynPublisher = Publisher<Box<dyn Poster>>;

pub fn build_fetcher(cfg: &AppConfig) -> anyhow::Result<StatusFetcher> {
    let fetcher = StatusFetcher::new(&cfg.source.url, &cfg.source.selector, cfg.source.population)?
        .with_timeout(Duration::from_secs(cfg.source.timeout_secs));
    Ok(fetcher)
}

/// Twitter in normal runs, stdout under `--dry-run`.
pub fn build_publisher(cfg: &AppConfig, dry_run: bool) -> anyhow::Result<DynPublisher> {
    let poster: Box<dyn Poster> = if dry_run {
        Box::new(StdoutPoster)
    } else {
        let credentials = TwitterCredentials {
            consumer_key: cfg.twitter.consumer_key.clone(),
            consumer_secret: cfg.twitter.consumer_secret.clone(),
            access_token: cfg.twitter.access_key.clone(),
            access_secret: cfg.twitter.secret_key.clone(),
        };
        let api = TwitterApi::new(&cfg.twitter.api_base, credentials)?
            .with_timeout(Duration::from_secs(cfg.source.timeout_secs));
        Box::new(api)
    };
    tracing::debug!(platform = poster.platform(), dry_run, "publisher.ready");
    Ok(Publisher::new(poster))
}

/// Prints the post instead of sending it.
pub struct StdoutPoster;

#[async_trait]
impl Poster for StdoutPoster {
    async fn post(&self, text: &str, _opts: &PostOptions) -> Result<PostReceipt, PublishError> {
        println!("{text}");
        Ok(PostReceipt {
            id: "dry-run".into(),
            text: text.to_string(),
        })
    }

    fn platform(&self) -> &'static str {
        "stdout"
    }
}
