use crate::progress::format_progress;
use asibar_http::HttpError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    /// The API answered and refused the post (auth, duplicate, rate limit, validation).
    #[error("post rejected with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    /// The OAuth header could not be built.
    #[error("cannot authorize request: {0}")]
    Auth(String),
}

impl From<HttpError> for PublishError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api {
                status, message, ..
            } => PublishError::Api {
                status: status.as_u16(),
                message,
            },
            other => PublishError::Transport(other.to_string()),
        }
    }
}

/// Optional passthrough parameters for a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOptions {
    /// Post as a reply to this post id.
    pub reply_to: Option<String>,
    /// Quote this post id.
    pub quote_tweet_id: Option<String>,
}

/// What the API echoed back for a created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub id: String,
    pub text: String,
}

#[async_trait]
pub trait Poster: Send + Sync {
    /// Create one post with the given text.
    async fn post(&self, text: &str, opts: &PostOptions) -> Result<PostReceipt, PublishError>;

    /// Short name used in log events.
    fn platform(&self) -> &'static str;
}

#[async_trait]
impl<T: Poster + ?Sized> Poster for Box<T> {
    async fn post(&self, text: &str, opts: &PostOptions) -> Result<PostReceipt, PublishError> {
        (**self).post(text, opts).await
    }

    fn platform(&self) -> &'static str {
        (**self).platform()
    }
}

pub struct Publisher<P> {
    poster: P,
}

impl<P: Poster> Publisher<P> {
    pub fn new(poster: P) -> Self {
        Self { poster }
    }

    pub fn format_progress(&self, ratio: f64) -> String {
        format_progress(ratio)
    }

    pub async fn publish(&self, text: &str) -> Result<PostReceipt, PublishError> {
        self.publish_with(text, &PostOptions::default()).await
    }

    pub async fn publish_with(
        &self,
        text: &str,
        opts: &PostOptions,
    ) -> Result<PostReceipt, PublishError> {
        tracing::info!(
            platform = self.poster.platform(),
            text,
            options = ?opts,
            "Posting"
        );
        let receipt = self.poster.post(text, opts).await?;
        tracing::debug!(
            platform = self.poster.platform(),
            id = %receipt.id,
            text = %receipt.text,
            "post.created"
        );
        Ok(receipt)
    }
}
