//! Publication date parsing shared by both feed pipelines.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// `Mon, 1 Jan 2024 10:00:00 +0000`, numeric offset only.
pub const RFC822_NUMERIC: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Expected shape of a feed's date strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DateFormat {
    /// RFC 2822, including named zones such as `GMT` or `EST`.
    Rfc2822,
    /// A chrono `strftime` pattern that must carry an offset (`%z`, `%:z`).
    Pattern(String),
}

impl DateFormat {
    pub fn rfc822_numeric() -> Self {
        DateFormat::Pattern(RFC822_NUMERIC.to_string())
    }
}

impl From<String> for DateFormat {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("rfc2822") {
            DateFormat::Rfc2822
        } else {
            DateFormat::Pattern(raw)
        }
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateFormat::Rfc2822 => f.write_str("rfc2822"),
            DateFormat::Pattern(p) => f.write_str(p),
        }
    }
}

/// Parses `raw` against `format`, keeping the source offset.
///
/// A mismatch is not an error: it yields `None` and the caller keeps the raw string.
pub fn parse_published(raw: &str, format: &DateFormat) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = match format {
        DateFormat::Rfc2822 => DateTime::parse_from_rfc2822(raw),
        DateFormat::Pattern(pattern) => DateTime::parse_from_str(raw, pattern),
    };

    match parsed {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::debug!(raw = %raw, format = %format, error = %e, "Date did not match expected format");
            None
        }
    }
}
