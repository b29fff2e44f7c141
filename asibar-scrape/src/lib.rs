//! Vaccination status acquisition.
//!
//! - [`StatusFetcher`] downloads the ministry page and turns it into a [`StatusResult`]
//! - [`extract`] holds the network-free part: DOM selection, script regexes, ratio math
//!
//! The page keeps its numbers in inline scripts under the country map, e.g.
//! `<script>var asiyapilankisisayisi2Doz = 9730410;</script>`. Those statements are
//! rendered server side, so no browser is needed to read them.

pub mod extract;
pub mod fetcher;

pub use extract::{Extractor, PageValues, ParseError, compute_ratio};
pub use fetcher::{StatusError, StatusFetcher, StatusResult};
