use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::dom::DomError;
use super::json::{self, JsonFeedError, ShapeMismatch};
use super::xml::{self, XmlOptions};
use crate::date::DateFormat;
use crate::entry::Entry;
use crate::util::{validate_feed_url, UrlError};

pub const DEFAULT_PROXY_ENDPOINT: &str =
    "https://ajax.googleapis.com/ajax/services/feed/load?v=1.0&num=-1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching and normalizing a feed.
///
/// Transport problems and malformed responses are distinct so callers can
/// tell "the feed is empty" apart from "the fetch failed".
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Feed URL or proxy endpoint is not a usable http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),
    /// Proxy response body is not JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
    /// Raw feed body is not well-formed XML
    #[error("Invalid XML: {0}")]
    Xml(#[from] DomError),
    /// JSON did not have the `responseData.feed.entries` structure
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),
}

impl FetchError {
    /// True for failures before a response body was available.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_)
                | FetchError::HttpStatus(_)
                | FetchError::Timeout
                | FetchError::ResponseTooLarge
        )
    }
}

impl From<JsonFeedError> for FetchError {
    fn from(e: JsonFeedError) -> Self {
        match e {
            JsonFeedError::Json(e) => FetchError::InvalidJson(e),
            JsonFeedError::Shape(e) => FetchError::ShapeMismatch(e),
        }
    }
}

/// Which pipeline a feed URL goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    /// Fetched through the JSON feed proxy.
    JsonApi,
    /// Fetched directly as RSS XML.
    Xml,
}

/// Everything a [`FeedClient`] needs besides the HTTP client itself.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// JSON proxy endpoint; the feed URL is appended as the `q` query parameter.
    pub proxy_endpoint: String,
    pub timeout: Duration,
    pub max_feed_size: usize,
    pub user_agent: String,
    pub json_date_format: DateFormat,
    pub xml: XmlOptions,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_feed_size: DEFAULT_MAX_FEED_SIZE,
            user_agent: concat!("jauzzi/", env!("CARGO_PKG_VERSION")).to_string(),
            json_date_format: DateFormat::rfc822_numeric(),
            xml: XmlOptions::default(),
        }
    }
}

/// Fetches feeds and normalizes them into [`Entry`] lists.
///
/// Each client owns its settings; independent clients (or concurrent calls
/// on one client) share no mutable state.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    settings: FeedSettings,
}

impl FeedClient {
    pub fn new(settings: FeedSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { http, settings })
    }

    /// Uses a caller-configured HTTP client.
    pub fn with_client(http: reqwest::Client, settings: FeedSettings) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Fetches `url` and delivers the entries to `callback`.
    ///
    /// The callback runs exactly once. Any failure is logged and delivered as
    /// an empty list; use [`FeedClient::fetch`] to see the error.
    pub async fn fetch_feed<F>(&self, url: &str, source: FeedSource, callback: F)
    where
        F: FnOnce(Vec<Entry>),
    {
        let entries = match self.fetch(url, source).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(feed = %url, error = %e, "Feed fetch failed, delivering no entries");
                Vec::new()
            }
        };
        callback(entries);
    }

    /// Fetches `url` through the pipeline selected by `source`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] - feed URL or proxy endpoint is not http(s)
    /// - [`FetchError::Network`], [`FetchError::Timeout`], [`FetchError::HttpStatus`],
    ///   [`FetchError::ResponseTooLarge`] - transport failures
    /// - [`FetchError::InvalidJson`], [`FetchError::ShapeMismatch`] - bad proxy response
    /// - [`FetchError::Xml`] - raw feed is not well-formed XML
    pub async fn fetch(&self, url: &str, source: FeedSource) -> Result<Vec<Entry>, FetchError> {
        let entries = match source {
            FeedSource::JsonApi => {
                let request_url = proxy_url(&self.settings.proxy_endpoint, url)?;
                let bytes = self.get_bytes(request_url.as_str()).await?;
                json::parse_json_feed(&bytes, &self.settings.json_date_format)?
            }
            FeedSource::Xml => {
                let request_url = validate_feed_url(url)?;
                let bytes = self.get_bytes(request_url.as_str()).await?;
                xml::parse_xml_feed(&bytes, &self.settings.xml)?
            }
        };

        tracing::debug!(feed = %url, source = ?source, entries = entries.len(), "Feed normalized");
        Ok(entries)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = tokio::time::timeout(self.settings.timeout, self.http.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        // The timeout above only covers the headers; the body gets the same budget.
        tokio::time::timeout(
            self.settings.timeout,
            read_limited_bytes(response, self.settings.max_feed_size),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
    }
}

/// Builds the proxy request URL, percent-encoding `feed_url` into the `q` parameter.
pub fn proxy_url(endpoint: &str, feed_url: &str) -> Result<Url, FetchError> {
    let mut url = validate_feed_url(endpoint)?;
    url.query_pairs_mut().append_pair("q", feed_url);
    Ok(url)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>Test</title><link>http://x/1</link></item>
</channel></rss>"#;

    const VALID_JSON: &str = r#"{"responseData": {"feed": {"entries": [
        {"title": "T1", "link": "http://x/1"}
    ]}}}"#;

    fn client_for(server: &MockServer) -> FeedClient {
        let settings = FeedSettings {
            proxy_endpoint: format!("{}/load?v=1.0&num=-1", server.uri()),
            ..FeedSettings::default()
        };
        FeedClient::new(settings).unwrap()
    }

    #[test]
    fn test_proxy_url_encodes_feed_url() {
        let url = proxy_url(DEFAULT_PROXY_ENDPOINT, "http://example.com/a b?x=1&y=2").unwrap();
        let q: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k == "q")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(q, [("q".to_string(), "http://example.com/a b?x=1&y=2".to_string())]);
        assert!(url.as_str().starts_with(DEFAULT_PROXY_ENDPOINT));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_proxy_url_rejects_bad_endpoint() {
        let err = proxy_url("ftp://proxy/load", "http://example.com").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_xml_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let entries = client
            .fetch(&format!("{}/feed", server.uri()), FeedSource::Xml)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title(), "Test");
    }

    #[tokio::test]
    async fn test_json_fetch_goes_through_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/load"))
            .and(query_param("q", "http://blog.example.com/feed"))
            .and(query_param("num", "-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let entries = client
            .fetch("http://blog.example.com/feed", FeedSource::JsonApi)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link(), "http://x/1");
    }

    #[tokio::test]
    async fn test_404_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch(&format!("{}/feed", server.uri()), FeedSource::Xml)
            .await
            .unwrap_err();
        match err {
            FetchError::HttpStatus(404) => {}
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_500_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch(&format!("{}/feed", server.uri()), FeedSource::Xml)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_shape_mismatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"responseData": null, "responseStatus": 403}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch("http://blog.example.com/feed", FeedSource::JsonApi)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ShapeMismatch(_)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_response_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&server)
            .await;

        let settings = FeedSettings {
            max_feed_size: 1024,
            ..FeedSettings::default()
        };
        let client = FeedClient::new(settings).unwrap();
        let err = client
            .fetch(&format!("{}/feed", server.uri()), FeedSource::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ResponseTooLarge));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let settings = FeedSettings {
            timeout: Duration::from_millis(50),
            ..FeedSettings::default()
        };
        let client = FeedClient::new(settings).unwrap();
        let err = client
            .fetch(&format!("{}/feed", server.uri()), FeedSource::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_malformed_xml_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch(&format!("{}/feed", server.uri()), FeedSource::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Xml(_)));
    }

    #[tokio::test]
    async fn test_invalid_feed_url() {
        let client = FeedClient::new(FeedSettings::default()).unwrap();
        let err = client
            .fetch("file:///etc/passwd", FeedSource::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_callback_gets_empty_list_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut calls = Vec::new();
        client
            .fetch_feed(&format!("{}/feed", server.uri()), FeedSource::Xml, |entries| {
                calls.push(entries)
            })
            .await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_empty());
    }

    #[tokio::test]
    async fn test_callback_gets_entries_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut delivered = None;
        client
            .fetch_feed(&format!("{}/feed", server.uri()), FeedSource::Xml, |entries| {
                delivered = Some(entries)
            })
            .await;
        assert_eq!(delivered.map(|e| e.len()), Some(1));
    }
}
