use anyhow::Context;
use asibar_scrape::{StatusFetcher, StatusResult};
use asibar_social::{PostReceipt, Poster, Publisher};

/// How a single run ended. A failed post still counts as a finished run.
#[derive(Debug)]
pub enum RunOutcome {
    Posted {
        status: StatusResult,
        receipt: PostReceipt,
    },
    PostFailed {
        status: StatusResult,
        text: String,
    },
}

/// Scrape once, then post once.
///
/// Scraping errors abort the run. Publishing errors are logged and swallowed so a
/// rejected post (duplicate text, rate limit) does not fail the scheduled job.
pub async fn run_once<P: Poster>(
    fetcher: &StatusFetcher,
    publisher: &Publisher<P>,
) -> anyhow::Result<RunOutcome> {
    let status = match fetcher.fetch_status().await {
        Ok(status) => status,
        Err(err) => {
            tracing::error!(error = %err, "Scraping failed");
            return Err(err).context("scraping vaccination status");
        }
    };
    tracing::info!(
        ratio = status.ratio,
        last_updated = %status.last_updated,
        "Scraped vaccination status"
    );

    let text = publisher.format_progress(status.ratio);
    match publisher.publish(&text).await {
        Ok(receipt) => Ok(RunOutcome::Posted { status, receipt }),
        Err(err) => {
            tracing::error!(error = %err, %text, "Posting failed");
            Ok(RunOutcome::PostFailed { status, text })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asibar_social::{PostOptions, PublishError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body><div class="svg-turkiye-haritasi">
<script>var asisayisiguncellemesaati = '19.05.2021 17:32';</script>
<script>var asiyapilankisisayisi2Doz = 41807181;</script>
</div></body></html>"#;

    struct CountingPoster {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingPoster {
        fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let poster = Self {
                calls: calls.clone(),
                fail,
            };
            (poster, calls)
        }
    }

    #[async_trait]
    impl Poster for CountingPoster {
        async fn post(&self, text: &str, _opts: &PostOptions) -> Result<PostReceipt, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PublishError::Api {
                    status: 403,
                    message: "duplicate content".into(),
                });
            }
            Ok(PostReceipt {
                id: "1394".into(),
                text: text.to_string(),
            })
        }

        fn platform(&self) -> &'static str {
            "counting"
        }
    }

    async fn page_server(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn fetcher(server: &MockServer) -> StatusFetcher {
        StatusFetcher::new(&server.uri(), ".svg-turkiye-haritasi", 83_614_362).unwrap()
    }

    #[tokio::test]
    async fn posts_the_rendered_bar() {
        let server = page_server(200, PAGE).await;
        let (poster, calls) = CountingPoster::new(false);
        let publisher = Publisher::new(poster);

        let outcome = run_once(&fetcher(&server), &publisher).await.unwrap();
        match outcome {
            RunOutcome::Posted { status, receipt } => {
                assert_eq!(status.ratio, 0.5);
                assert_eq!(status.last_updated, "19.05.2021 17:32");
                assert_eq!(receipt.text, "▓▓▓▓▓▓▓▓▓▓░░░░░░░░░░ %50,00");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let server = page_server(200, PAGE).await;
        let (poster, calls) = CountingPoster::new(true);
        let publisher = Publisher::new(poster);

        let outcome = run_once(&fetcher(&server), &publisher).await.unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::PostFailed { ref text, .. } if text.ends_with("%50,00")
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scrape_failure_aborts_before_posting() {
        let server = page_server(500, "boom").await;
        let (poster, calls) = CountingPoster::new(false);
        let publisher = Publisher::new(Box::new(poster) as Box<dyn Poster>);

        let err = run_once(&fetcher(&server), &publisher).await.unwrap_err();
        assert!(format!("{err:#}").contains("scraping vaccination status"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn page_without_values_aborts() {
        let server = page_server(200, "<html><body>bakım</body></html>").await;
        let (poster, calls) = CountingPoster::new(false);
        let publisher = Publisher::new(poster);

        assert!(run_once(&fetcher(&server), &publisher).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
