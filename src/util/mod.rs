//! Utility functions shared by the feed pipelines.
//!
//! - **URL validation**: feed and proxy URLs must be absolute http(s) URLs

mod url_validator;

pub use url_validator::{validate_feed_url, UrlError};
