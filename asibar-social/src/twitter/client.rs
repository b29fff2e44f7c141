//! Minimal wrapper around the Twitter/X v2 "create tweet" endpoint.
//!
//! Signs each request with OAuth 1.0a user context and delegates transport to the
//! shared HTTP client. One attempt per post; failures surface as [`PublishError`].
use crate::publisher::{PostOptions, PostReceipt, Poster, PublishError};
use crate::twitter::oauth::{OAuth1Signer, TwitterCredentials};
use crate::twitter::types::{CreateTweetRequest, CreateTweetResponse, CreatedTweet, Reply};
use asibar_http::{Auth, HttpClient, RequestOpts};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

const CREATE_TWEET_PATH: &str = "2/tweets";

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    signer: OAuth1Signer,
}

impl TwitterApi {
    /// `base` is the API root, normally `https://api.twitter.com`.
    pub fn new(base: &str, credentials: TwitterCredentials) -> Result<Self, PublishError> {
        Ok(Self {
            http: HttpClient::new(base)?,
            signer: OAuth1Signer::new(credentials),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub async fn create_tweet(
        &self,
        text: &str,
        opts: &PostOptions,
    ) -> Result<CreatedTweet, PublishError> {
        let url = self.http.url_for(CREATE_TWEET_PATH)?;
        let auth = Auth::Header {
            name: AUTHORIZATION,
            value: self.signer.authorize("POST", &url, &[])?,
        };

        let body = CreateTweetRequest {
            text,
            reply: opts.reply_to.as_deref().map(|id| Reply {
                in_reply_to_tweet_id: id,
            }),
            quote_tweet_id: opts.quote_tweet_id.as_deref(),
        };

        let resp: CreateTweetResponse = self
            .http
            .post_json(
                CREATE_TWEET_PATH,
                &body,
                RequestOpts {
                    auth,
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!("Twitter create response: {:?}", resp);
        Ok(resp.data)
    }
}

#[async_trait]
impl Poster for TwitterApi {
    async fn post(&self, text: &str, opts: &PostOptions) -> Result<PostReceipt, PublishError> {
        let CreatedTweet { id, text } = self.create_tweet(text, opts).await?;
        Ok(PostReceipt { id, text })
    }

    fn platform(&self) -> &'static str {
        "twitter"
    }
}
