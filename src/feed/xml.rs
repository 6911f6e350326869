//! Normalizer for raw RSS documents.
//!
//! The default [`Alignment::Positional`] layout walks every channel-level
//! element's children and collects same-tag nodes into parallel lists, then
//! rebuilds entry `i` from position `i` of each list. `<link>` drives the
//! entry count. Channel children other than `<item>` (a channel `<image>`
//! block, for instance) take part in the walk, which is what puts a
//! sentinel-titled row into the lists for some WordPress feeds. When that row
//! is seen it is skipped and media lookups for the rest of the document shift
//! by one.
//!
//! [`Alignment::PerItem`] reads each `<item>` on its own instead.

use serde::Deserialize;

use super::dom::{parse_document, DomError, Element};
use crate::date::{parse_published, DateFormat};
use crate::entry::Entry;

pub const MEDIA_CONTENT: &str = "media:content";

/// Title that marks a feed with the shifted media layout.
pub const WORDPRESS_QUIRK_TITLE: &str = "Estudia La Biblia";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Parallel sibling lists matched by index. Deprecated; kept for feeds
    /// that still rely on the shifted media layout.
    #[default]
    Positional,
    /// Fields grouped by their enclosing `<item>`.
    PerItem,
}

#[derive(Debug, Clone)]
pub struct XmlOptions {
    pub date_format: DateFormat,
    pub alignment: Alignment,
    pub quirk_title: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            date_format: DateFormat::Rfc2822,
            alignment: Alignment::default(),
            quirk_title: WORDPRESS_QUIRK_TITLE.to_string(),
        }
    }
}

pub fn parse_xml_feed(bytes: &[u8], options: &XmlOptions) -> Result<Vec<Entry>, DomError> {
    let root = parse_document(bytes)?;
    Ok(normalize(&root, options))
}

/// Converts an RSS document tree into entries, in source order.
pub fn normalize(root: &Element, options: &XmlOptions) -> Vec<Entry> {
    match options.alignment {
        Alignment::Positional => {
            tracing::debug!("Using deprecated positional alignment for XML feed");
            Columns::collect(root).into_entries(options)
        }
        Alignment::PerItem => per_item_entries(root, options),
    }
}

/// Same-tag nodes gathered in document order across all item-level elements.
#[derive(Debug, Default)]
struct Columns<'a> {
    titles: Vec<&'a Element>,
    descriptions: Vec<&'a Element>,
    links: Vec<&'a Element>,
    pub_dates: Vec<&'a Element>,
    /// One list per item-level element that has at least one `<category>`.
    categories: Vec<Vec<&'a Element>>,
    media_contents: Vec<&'a Element>,
}

impl<'a> Columns<'a> {
    fn collect(root: &'a Element) -> Self {
        let mut columns = Self::default();

        for channel in root.elements() {
            for item in channel.elements() {
                for child in item.elements() {
                    match child.name.as_str() {
                        "title" => columns.titles.push(child),
                        "description" => columns.descriptions.push(child),
                        "link" => columns.links.push(child),
                        "pubDate" => columns.pub_dates.push(child),
                        _ => {}
                    }
                }

                let categories: Vec<&Element> = item.children_named("category").collect();
                if !categories.is_empty() {
                    columns.categories.push(categories);
                }

                let media: Vec<&Element> = item.children_named(MEDIA_CONTENT).collect();
                columns.media_contents.extend(&media);
                // A lone media:content is also reached by the direct path
                // lookup and lands in the list twice. Media indices below
                // depend on that.
                if media.len() == 1 {
                    if let Some(single) = item.child(MEDIA_CONTENT) {
                        columns.media_contents.push(single);
                    }
                }
            }
        }

        columns
    }

    fn into_entries(self, options: &XmlOptions) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.links.len());
        let mut offset_media = false;

        for i in 0..self.links.len() {
            let title = text_at(&self.titles, i);
            if title == options.quirk_title {
                tracing::debug!(index = i, "Skipping sentinel row, shifting media lookups");
                offset_media = true;
                continue;
            }

            let media_index = if offset_media {
                i.checked_sub(1)
            } else {
                Some(i.saturating_sub(1))
            };
            let media_url = media_index
                .and_then(|idx| self.media_contents.get(idx))
                .and_then(|m| m.attr("url"))
                .map(str::to_string);

            let categories: Vec<String> = self
                .categories
                .get(i)
                .map(|cats| cats.iter().map(|c| c.text().to_string()).collect())
                .unwrap_or_default();

            let raw_date = text_at(&self.pub_dates, i);
            let published = parse_published(raw_date, &options.date_format);

            entries.push(
                Entry::builder(title)
                    .description(Some(text_at(&self.descriptions, i).to_string()))
                    .link(text_at(&self.links, i))
                    .categories(categories)
                    .dates(raw_date, published)
                    .media_url(media_url)
                    .build(),
            );
        }

        entries
    }
}

fn text_at<'a>(column: &[&'a Element], index: usize) -> &'a str {
    column.get(index).map(|e| e.text()).unwrap_or("")
}

fn per_item_entries(root: &Element, options: &XmlOptions) -> Vec<Entry> {
    let mut entries = Vec::new();

    for channel in root.elements() {
        for item in channel.children_named("item") {
            let title = item.child_text("title").unwrap_or("");
            if title == options.quirk_title {
                continue;
            }

            let raw_date = item.child_text("pubDate").unwrap_or("");
            let published = parse_published(raw_date, &options.date_format);

            let media_url = item
                .child(MEDIA_CONTENT)
                .or_else(|| item.child("enclosure"))
                .and_then(|m| m.attr("url"))
                .map(str::to_string);

            entries.push(
                Entry::builder(title)
                    .description(Some(item.child_text("description").unwrap_or("").to_string()))
                    .link(item.child_text("link").unwrap_or(""))
                    .categories(
                        item.children_named("category")
                            .map(|c| c.text().to_string())
                            .collect(),
                    )
                    .dates(raw_date, published)
                    .media_url(media_url)
                    .build(),
            );
        }
    }

    entries
}
