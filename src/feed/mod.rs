//! Feed fetching and normalization.
//!
//! Two pipelines produce the same [`Entry`](crate::Entry) records:
//!
//! - [`json`] - the JSON feed API shape (`responseData.feed.entries`)
//! - [`xml`] - raw RSS documents, read through the [`dom`] element tree
//!
//! [`fetcher`] ties them to HTTP through [`FeedClient`].
//!
//! # Example
//!
//! ```ignore
//! use jauzzi::{FeedClient, FeedSettings, FeedSource};
//!
//! let client = FeedClient::new(FeedSettings::default())?;
//! client
//!     .fetch_feed("https://www.theverge.com/rss/index.xml", FeedSource::Xml, |entries| {
//!         println!("{} entries", entries.len());
//!     })
//!     .await;
//! ```

pub mod dom;
pub mod fetcher;
pub mod json;
pub mod xml;

pub use dom::{parse_document, DomError, Element};
pub use fetcher::{proxy_url, FeedClient, FeedSettings, FeedSource, FetchError};
pub use json::{parse_json_feed, JsonFeedError, ShapeMismatch};
pub use xml::{parse_xml_feed, Alignment, XmlOptions};
