//! Common utilities shared across the asibar crates.
//!
//! Today this is only the tracing setup in [`observability`]; each library crate owns
//! its own error type, and the binary glues them together with `anyhow`.
//!
//! # Examples
//!
//! ```rust
//! use asibar_common::observability::{filter_for_level, LogConfig};
//!
//! let cfg = LogConfig {
//!     default_filter: filter_for_level(10).to_string(),
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.default_filter, "debug");
//! ```

pub mod observability;
