//! Integration tests for `NewsClient` using wiremock HTTP mocks.

use orgtrust_news::{NewsClient, NewsError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>search results</title>
    <item>
      <title>Example Plumbing wins regional award</title>
      <link>https://news.example.com/award</link>
      <pubDate>Mon, 12 May 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Example Plumbing announces expansion into Bergen</title>
      <link>https://news.example.com/expansion</link>
      <pubDate>Tue, 20 May 2025 09:30:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

#[tokio::test]
async fn collect_fetches_parses_and_scores() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .and(query_param("q", "Example Plumbing AS"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FEED)
                .insert_header("content-type", "application/rss+xml"),
        )
        .mount(&server)
        .await;

    let client = NewsClient::with_base_url(10, &server.uri()).expect("client should build");
    let signals = client
        .collect("Example Plumbing AS")
        .await
        .expect("collection should succeed");

    assert_eq!(signals.len(), 2);
    // Newest first.
    assert!(signals[0].url.ends_with("/expansion"));
    assert!(signals[0].sentiment > 0.0);
    assert!(signals[1].sentiment > 0.0);
}

#[tokio::test]
async fn http_failure_is_a_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = NewsClient::with_base_url(10, &server.uri()).expect("client should build");
    let err = client.collect("Example Plumbing AS").await.unwrap_err();
    assert!(matches!(err, NewsError::Http(_)));
}

#[tokio::test]
async fn empty_feed_yields_empty_signals() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<rss><channel></channel></rss>"),
        )
        .mount(&server)
        .await;

    let client = NewsClient::with_base_url(10, &server.uri()).expect("client should build");
    let signals = client.collect("Nobody Knows This Company").await.unwrap();
    assert!(signals.is_empty());
}
