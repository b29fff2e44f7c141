//! Turning a coverage ratio into a post and getting it published.
//!
//! - [`progress`]: the text rendering (`▓▓▓░░… %23,45`)
//! - [`publisher`]: the [`Poster`] seam and the [`Publisher`] that logs around it
//! - [`twitter`]: the Twitter/X v2 client, signed with OAuth 1.0a user credentials
pub mod progress;
pub mod publisher;
pub mod twitter;

pub use progress::format_progress;
pub use publisher::{PostOptions, PostReceipt, Poster, PublishError, Publisher};
