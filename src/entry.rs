//! The normalized feed entry produced by both feed pipelines.
//!
//! An [`Entry`] is built once by a normalizer through [`EntryBuilder`] and is
//! read-only afterwards. The one exception is the favorite flag, which belongs
//! to the consuming application and always starts out `false`.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

/// Kind of an attached media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Image,
    Video,
    /// Any other `medium` value, kept verbatim (empty when the field was missing).
    Other(String),
}

impl Medium {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => Medium::Image,
            "video" => Medium::Video,
            other => Medium::Other(other.to_string()),
        }
    }
}

/// One media object found inside a JSON feed's `mediaGroups[].contents[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaContent {
    pub medium: Medium,
    pub url: String,
}

impl MediaContent {
    /// Decodes a single content map.
    ///
    /// Returns `None` when the value is not an object or has no string `url`.
    /// A missing or non-string `medium` decodes to `Medium::Other("")`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let url = map.get("url")?.as_str()?.to_string();
        let medium = map
            .get("medium")
            .and_then(Value::as_str)
            .map(Medium::parse)
            .unwrap_or_else(|| Medium::Other(String::new()));
        Some(Self { medium, url })
    }

    pub fn is_image(&self) -> bool {
        self.medium == Medium::Image
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    title: String,
    link: String,
    description: Option<String>,
    html_content: Option<String>,
    content_snippet: Option<String>,
    author: Option<String>,
    categories: Vec<String>,
    pub_date: String,
    published_date: Option<DateTime<FixedOffset>>,
    media_url: Option<String>,
    images: Vec<String>,
    media: Vec<MediaContent>,
    is_favorite: bool,
}

impl Entry {
    pub fn builder(title: impl Into<String>) -> EntryBuilder {
        EntryBuilder::new(title)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// Plain description (XML pipeline).
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Full HTML body (JSON pipeline `content`).
    pub fn html_content(&self) -> Option<&str> {
        self.html_content.as_deref()
    }

    pub fn content_snippet(&self) -> Option<&str> {
        self.content_snippet.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Raw date string exactly as received.
    pub fn pub_date(&self) -> &str {
        &self.pub_date
    }

    /// Parsed form of [`Entry::pub_date`], `None` when it did not match the expected format.
    pub fn published_date(&self) -> Option<DateTime<FixedOffset>> {
        self.published_date
    }

    /// Representative media URL (XML pipeline).
    pub fn media_url(&self) -> Option<&str> {
        self.media_url.as_deref()
    }

    /// Image URLs in media-group order (JSON pipeline).
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn media(&self) -> &[MediaContent] {
        &self.media
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn set_favorite(&mut self, favorite: bool) {
        self.is_favorite = favorite;
    }

    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }

    /// Body text to show, preferring the richest variant available.
    pub fn display_body(&self) -> &str {
        self.html_content
            .as_deref()
            .or(self.description.as_deref())
            .or(self.content_snippet.as_deref())
            .unwrap_or("")
    }
}

/// Assembles an [`Entry`] field by field.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    entry: Entry,
}

impl EntryBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            entry: Entry {
                title: title.into(),
                link: String::new(),
                description: None,
                html_content: None,
                content_snippet: None,
                author: None,
                categories: Vec::new(),
                pub_date: String::new(),
                published_date: None,
                media_url: None,
                images: Vec::new(),
                media: Vec::new(),
                is_favorite: false,
            },
        }
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.entry.link = link.into();
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.entry.description = description;
        self
    }

    pub fn html_content(mut self, html: Option<String>) -> Self {
        self.entry.html_content = html;
        self
    }

    pub fn content_snippet(mut self, snippet: Option<String>) -> Self {
        self.entry.content_snippet = snippet;
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.entry.author = author;
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.entry.categories = categories;
        self
    }

    /// Sets the raw date together with its parsed form so the two never disagree.
    pub fn dates(mut self, raw: impl Into<String>, parsed: Option<DateTime<FixedOffset>>) -> Self {
        self.entry.pub_date = raw.into();
        self.entry.published_date = parsed;
        self
    }

    pub fn media_url(mut self, url: Option<String>) -> Self {
        self.entry.media_url = url;
        self
    }

    /// Stores the decoded media list and derives `images` from its image-medium items.
    pub fn media(mut self, media: Vec<MediaContent>) -> Self {
        self.entry.images = media
            .iter()
            .filter(|m| m.is_image())
            .map(|m| m.url.clone())
            .collect();
        self.entry.media = media;
        self
    }

    pub fn build(self) -> Entry {
        self.entry
    }
}
