//! Feed fetching over HTTP.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::{FeedItem, LinkList};

/// Default timeout for a whole fetch (request and body).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a feed.
///
/// Every variant is non-fatal for the poll loop: the cycle is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response too large")]
    ResponseTooLarge,

    /// Body is not a well-formed RSS document
    #[error("Parse error: {0}")]
    Parse(#[from] rss::Error),
}

/// Fetches one RSS feed.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl FeedFetcher {
    /// Creates a fetcher for `url` using a shared HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Sets the timeout for a whole fetch.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the feed and returns its item links in document order.
    ///
    /// # Errors
    ///
    /// See [`FeedFetcher::fetch_items`].
    pub async fn fetch_links(&self) -> Result<LinkList, FetchError> {
        let items = self.fetch_items().await?;
        Ok(items.into_iter().map(|item| item.link).collect())
    }

    /// Fetches the feed and returns its items in document order (usually newest first).
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout, non-2xx status,
    /// oversized body or malformed XML.
    pub async fn fetch_items(&self) -> Result<Vec<FeedItem>, FetchError> {
        let body = tokio::time::timeout(self.timeout, self.fetch_body())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        let items = parse_items(&body)?;
        debug!(feed = %self.url, items = items.len(), "Fetched feed");
        Ok(items)
    }

    async fn fetch_body(&self) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_FEED_SIZE as u64)
        {
            return Err(FetchError::ResponseTooLarge);
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_FEED_SIZE {
            return Err(FetchError::ResponseTooLarge);
        }

        Ok(bytes.to_vec())
    }
}

/// Parses an RSS document into items, in document order.
///
/// Items without a `<link>` are skipped.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if the body is not a valid RSS channel.
pub fn parse_items(body: &[u8]) -> Result<Vec<FeedItem>, FetchError> {
    // Some feeds emit whitespace before the XML declaration.
    let channel = rss::Channel::read_from(body.trim_ascii_start())?;

    let total = channel.items().len();
    let items: Vec<FeedItem> = channel.items().iter().filter_map(FeedItem::from_rss).collect();

    if items.len() < total {
        debug!(skipped = total - items.len(), "Items without a link skipped");
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const FEED_XML: &str = r#"
<?xml version="1.0" encoding="utf-8"?><?xml-stylesheet type="text/xsl" href="https://www.example.com/xsl"?>
<rss xmlns:media="http://search.yahoo.com/mrss/" version="2.0">
    <channel>
        <title>news | TEST</title>
        <description>newsdescription</description>
        <link>http://www.example.com</link>
        <language>en</language>
        <pubDate>Sun, 16 Aug 2020 13:43:44 +0300</pubDate>
        <item>
            <title><![CDATA[Example news title1]]></title>
            <link>https://example.com/news/item1</link>
            <description><![CDATA[Example news description1 ]]></description>
            <media:thumbnail url='https://example.com/news/item1/picture1.jpg' height='75' width='75' />
            <guid isPermaLink="true">https://example.com/11111111</guid>
            <pubDate>Sun, 16 Aug 2020 13:30:00 +0300</pubDate>
        </item>
        <item>
            <title><![CDATA[Example news title2]]></title>
            <link>https://example.com/news/item2</link>
            <guid isPermaLink="true">https://example.com/222222222</guid>
            <pubDate>Sun, 16 Aug 2020 13:30:00 +0300</pubDate>
        </item>
        <item>
            <title><![CDATA[Example news title3]]></title>
            <link>https://example.com/news/item3</link>
            <guid isPermaLink="true">https://example.com/333333333</guid>
            <pubDate>Sun, 16 Aug 2020 13:30:00 +0300</pubDate>
        </item>
    </channel>
</rss>"#;

    async fn serve(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn fetcher(server: &MockServer) -> FeedFetcher {
        FeedFetcher::new(reqwest::Client::new(), format!("{}/feed", server.uri()))
    }

    #[tokio::test]
    async fn test_fetch_links_in_document_order() {
        let server = serve(ResponseTemplate::new(200).set_body_string(FEED_XML)).await;

        let links = fetcher(&server).fetch_links().await.unwrap();
        assert_eq!(links.len(), 3);
        assert_eq!(links.get(1), Some("https://example.com/news/item2"));
        assert_eq!(links.first(), Some("https://example.com/news/item1"));
    }

    #[tokio::test]
    async fn test_fetch_items_carries_metadata() {
        let server = serve(ResponseTemplate::new(200).set_body_string(FEED_XML)).await;

        let items = fetcher(&server).fetch_items().await.unwrap();
        assert_eq!(items[2].title.as_deref(), Some("Example news title3"));
        assert!(items.iter().all(|i| i.published.is_some()));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = serve(ResponseTemplate::new(404)).await;

        match fetcher(&server).fetch_links().await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_xml() {
        let server = serve(ResponseTemplate::new(200).set_body_string("<not valid xml")).await;

        match fetcher(&server).fetch_links().await {
            Err(FetchError::Parse(_)) => {}
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = serve(
            ResponseTemplate::new(200)
                .set_body_string(FEED_XML)
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let result = fetcher(&server)
            .with_timeout(Duration::from_millis(100))
            .fetch_links()
            .await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[test]
    fn test_parse_empty_channel() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title></channel></rss>"#;
        assert!(parse_items(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_skips_items_without_link() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
    <item><title>no link</title></item>
    <item><link>https://example.com/a</link></item>
</channel></rss>"#;
        let items = parse_items(xml.as_bytes()).unwrap();
        assert_eq!(items, vec![FeedItem::new("https://example.com/a")]);
    }
}
