//! Twitter/X API integration.
//!
//! Only tweet creation is implemented. Requests are signed per RFC 5849 with the
//! four long-lived credentials of the posting account; see [`oauth`].
pub mod client;
pub mod oauth;
pub mod types;

pub use client::TwitterApi;
pub use oauth::TwitterCredentials;
