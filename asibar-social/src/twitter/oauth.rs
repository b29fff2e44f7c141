//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! Twitter still requires user-context OAuth 1.0a for posting on behalf of an account
//! that only has the classic consumer/access key pairs. JSON bodies are not part of
//! the signature; only query parameters (and form fields, when a caller passes them
//! as `extra`) are.
use crate::publisher::PublishError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::header::HeaderValue;
use sha1::Sha1;
use std::fmt;
use time::OffsetDateTime;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay as they are; everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LEN: usize = 32;

/// The four long-lived secrets of the posting account.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

#[derive(Clone, Debug)]
pub struct OAuth1Signer {
    credentials: TwitterCredentials,
}

impl OAuth1Signer {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self { credentials }
    }

    /// Build the `Authorization` header for one request with a fresh nonce and timestamp.
    pub fn authorize(
        &self,
        method: &str,
        url: &Url,
        extra: &[(&str, &str)],
    ) -> Result<HeaderValue, PublishError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let header = self.header_with(method, url, extra, &nonce, timestamp)?;
        HeaderValue::from_str(&header).map_err(|e| PublishError::Auth(e.to_string()))
    }

    pub(crate) fn header_with(
        &self,
        method: &str,
        url: &Url,
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, PublishError> {
        let timestamp = timestamp.to_string();
        let mut oauth: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.credentials.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let base = signature_base_string(method, url, &oauth, extra);
        let signature = self.sign(&base)?;
        oauth.push(("oauth_signature", signature.as_str()));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }

    fn sign(&self, base: &str) -> Result<String, PublishError> {
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.access_secret)
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| PublishError::Auth(e.to_string()))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&enc(base_url)&enc(sorted_params)`, per RFC 5849 section 3.4.1.
fn signature_base_string(
    method: &str,
    url: &Url,
    oauth: &[(&str, &str)],
    extra: &[(&str, &str)],
) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(
            oauth
                .iter()
                .chain(extra.iter())
                .map(|(k, v)| (encode(k), encode(v))),
        )
        .collect();
    params.sort();

    let normalized = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(base_url.as_str()),
        encode(&normalized)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference request from Twitter's "Creating a signature" guide.
    fn reference_signer() -> OAuth1Signer {
        OAuth1Signer::new(TwitterCredentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".into(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".into(),
            access_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".into(),
        })
    }
    const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const TIMESTAMP: i64 = 1318622958;
    const STATUS: (&str, &str) = ("status", "Hello Ladies + Gentlemen, a signed OAuth request!");

    fn reference_url() -> Url {
        Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true").unwrap()
    }

    #[test]
    fn base_string_matches_reference() {
        let oauth = [
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", NONCE),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
            ("oauth_version", "1.0"),
        ];
        let base = signature_base_string("post", &reference_url(), &oauth, &[STATUS]);
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn signature_matches_reference() {
        let header = reference_signer()
            .header_with("POST", &reference_url(), &[STATUS], NONCE, TIMESTAMP)
            .unwrap();
        assert!(
            header.contains(r#"oauth_signature="hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D""#),
            "{header}"
        );
    }

    #[test]
    fn header_lists_sorted_encoded_fields() {
        let url = Url::parse("https://api.twitter.com/2/tweets").unwrap();
        let header = reference_signer()
            .header_with("POST", &url, &[], "abc", 1)
            .unwrap();
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", oauth_nonce=\"abc\", oauth_signature=\""));
        assert!(header.ends_with(
            "oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1\", oauth_token=\"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\", oauth_version=\"1.0\""
        ));
    }

    #[test]
    fn fresh_nonce_per_request() {
        let url = Url::parse("https://api.twitter.com/2/tweets").unwrap();
        let signer = reference_signer();
        let a = signer.authorize("POST", &url, &[]).unwrap();
        let b = signer.authorize("POST", &url, &[]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_redacts_everything() {
        let rendered = format!("{:?}", reference_signer());
        assert!(!rendered.contains("xvz1evFS4wEEPTGEFPHBog"));
        assert!(!rendered.contains("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"));
    }
}
