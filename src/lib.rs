//! Fetches RSS feeds, either through a JSON feed proxy or as raw XML, and
//! normalizes them into [`Entry`] records.

pub mod config;
pub mod date;
pub mod entry;
pub mod feed;
pub mod util;

pub use config::{Config, ConfigError};
pub use date::{parse_published, DateFormat};
pub use entry::{Entry, EntryBuilder, MediaContent, Medium};
pub use feed::{Alignment, FeedClient, FeedSettings, FeedSource, FetchError, XmlOptions};
