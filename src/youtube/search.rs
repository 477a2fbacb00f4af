//! Topic to video search through the YouTube Data API

use super::models::{SearchResponse, VideoDuration};
use crate::config::YoutubeConfig;
use crate::error::{Result, YoutubeError};
use crate::observability::MetricsCollector;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Words kept from the caller's phrase
const QUERY_WORDS: usize = 4;

/// Words kept for the fallback search
const FALLBACK_WORDS: usize = 2;

/// Finds a representative video for a topic
pub struct VideoSearchClient {
    config: YoutubeConfig,
    http_client: Client,
    metrics: Option<Arc<MetricsCollector>>,
}

impl VideoSearchClient {
    /// Create a new search client
    pub fn new(config: YoutubeConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(YoutubeError::from)?;

        if config.api_key.is_none() {
            warn!("YouTube API key is not configured, video search will return no results");
        }

        Ok(Self {
            config,
            http_client,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn default_max_results(&self) -> u32 {
        self.config.max_results
    }

    /// Search with the configured default duration and result count
    pub async fn search_default(&self, query: &str) -> Option<String> {
        self.search(query, VideoDuration::default(), self.config.max_results).await
    }

    /// Return the id of the first matching video, `None` when nothing was found.
    ///
    /// Never fails: blank queries, a missing key and backend errors all map to `None`.
    pub async fn search(&self, query: &str, duration: VideoDuration, max_results: u32) -> Option<String> {
        let found = self.search_inner(query, duration, max_results).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_video_search(found.is_some());
        }

        found
    }

    async fn search_inner(&self, query: &str, duration: VideoDuration, max_results: u32) -> Option<String> {
        if query.trim().is_empty() {
            warn!("{}", YoutubeError::EmptyQuery);
            return None;
        }

        let Some(api_key) = &self.config.api_key else {
            error!("{}", YoutubeError::MissingApiKey);
            return None;
        };

        let simplified = simplify_query(query, QUERY_WORDS);
        let final_query = qualify_query(&simplified, &self.config.source_qualifier);
        info!("Searching YouTube with query: {:?}", final_query);

        match self.search_once(api_key, &final_query, duration, max_results).await {
            Ok(Some(video_id)) => {
                info!("Found video: {}", video_id);
                return Some(video_id);
            }
            Ok(None) => info!("No results found for query: {:?}", final_query),
            Err(e) => {
                error!("YouTube search failed: {}", e);
                return None;
            }
        }

        if simplified.split_whitespace().count() <= FALLBACK_WORDS {
            return None;
        }

        let fallback_query = qualify_query(
            &simplify_query(&simplified, FALLBACK_WORDS),
            &self.config.source_qualifier,
        );
        info!("Trying fallback search with: {:?}", fallback_query);

        match self.search_once(api_key, &fallback_query, duration, max_results).await {
            Ok(Some(video_id)) => {
                info!("Found video with fallback search: {}", video_id);
                Some(video_id)
            }
            Ok(None) => {
                info!("No results found for fallback query: {:?}", fallback_query);
                None
            }
            Err(e) => {
                error!("YouTube fallback search failed: {}", e);
                None
            }
        }
    }

    async fn search_once(
        &self,
        api_key: &Secret<String>,
        query: &str,
        duration: VideoDuration,
        max_results: u32,
    ) -> std::result::Result<Option<String>, YoutubeError> {
        let url = format!("{}/search", self.config.api_url.trim_end_matches('/'));
        let max_results = max_results.to_string();

        let response = self
            .http_client
            .get(url)
            .query(&[
                ("key", api_key.expose_secret().as_str()),
                ("q", query),
                ("videoDuration", duration.as_str()),
                ("videoEmbeddable", "true"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("part", "id"),
                ("relevanceLanguage", self.config.relevance_language.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YoutubeError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!("YouTube returned {} item(s)", parsed.items.len());

        Ok(parsed.first_video_id())
    }
}

/// Keep the first `max_words` whitespace-separated words
pub fn simplify_query(query: &str, max_words: usize) -> String {
    query
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append the source qualifier unless the query already mentions it
pub fn qualify_query(query: &str, qualifier: &str) -> String {
    let qualifier = qualifier.trim();
    if qualifier.is_empty() || query.to_lowercase().contains(&qualifier.to_lowercase()) {
        query.to_string()
    } else {
        format!("{} {}", query, qualifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_config(api_url: String, api_key: Option<&str>) -> YoutubeConfig {
        YoutubeConfig {
            api_url,
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            timeout_secs: 8,
            max_results: 5,
            source_qualifier: "Khan Academy".to_string(),
            relevance_language: "en".to_string(),
        }
    }

    fn search_body(video_id: Option<&str>) -> String {
        match video_id {
            Some(id) => format!(r#"{{"items": [{{"id": {{"kind": "youtube#video", "videoId": "{}"}}}}]}}"#, id),
            None => r#"{"items": []}"#.to_string(),
        }
    }

    #[test]
    fn test_simplify_query() {
        assert_eq!(simplify_query("intro to linear algebra vectors", 4), "intro to linear algebra");
        assert_eq!(simplify_query("  calculus   limits ", 4), "calculus limits");
        assert_eq!(simplify_query("one two three", 2), "one two");
    }

    #[test]
    fn test_qualify_query_is_idempotent() {
        assert_eq!(qualify_query("calculus limits", "Khan Academy"), "calculus limits Khan Academy");
        assert_eq!(qualify_query("khan academy calculus", "Khan Academy"), "khan academy calculus");
        assert_eq!(qualify_query("calculus", ""), "calculus");
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = VideoSearchClient::new(test_config(server.url(), Some("key"))).unwrap();

        assert!(client.search("", VideoDuration::Medium, 5).await.is_none());
        assert!(client.search("   ", VideoDuration::Medium, 5).await.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = VideoSearchClient::new(test_config(server.url(), None)).unwrap();

        assert!(client.search_default("calculus").await.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_sends_expected_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "yt-key".into()),
                Matcher::UrlEncoded("q".into(), "intro to linear algebra Khan Academy".into()),
                Matcher::UrlEncoded("videoDuration".into(), "short".into()),
                Matcher::UrlEncoded("videoEmbeddable".into(), "true".into()),
                Matcher::UrlEncoded("type".into(), "video".into()),
                Matcher::UrlEncoded("maxResults".into(), "3".into()),
                Matcher::UrlEncoded("part".into(), "id".into()),
                Matcher::UrlEncoded("relevanceLanguage".into(), "en".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(search_body(Some("vid-1")))
            .create_async()
            .await;

        let client = VideoSearchClient::new(test_config(server.url(), Some("yt-key"))).unwrap();
        let found = client
            .search("intro to linear algebra and vectors", VideoDuration::Short, 3)
            .await;

        assert_eq!(found.as_deref(), Some("vid-1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fallback_uses_first_two_words() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), "intro to linear algebra Khan Academy".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(search_body(None))
            .expect(1)
            .create_async()
            .await;
        let fallback = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), "intro to Khan Academy".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(search_body(Some("fallback-vid")))
            .expect(1)
            .create_async()
            .await;

        let client = VideoSearchClient::new(test_config(server.url(), Some("yt-key"))).unwrap();
        let found = client.search_default("intro to linear algebra").await;

        assert_eq!(found.as_deref(), Some("fallback-vid"));
        first.assert_async().await;
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn test_short_query_has_no_fallback() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(search_body(None))
            .expect(1)
            .create_async()
            .await;

        let client = VideoSearchClient::new(test_config(server.url(), Some("yt-key"))).unwrap();

        assert!(client.search_default("derivatives").await.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_returns_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"message": "quotaExceeded"}}"#)
            .expect(1)
            .create_async()
            .await;

        let metrics = Arc::new(MetricsCollector::new());
        let client = VideoSearchClient::new(test_config(server.url(), Some("yt-key")))
            .unwrap()
            .with_metrics(metrics.clone());

        assert!(client.search_default("intro to linear algebra").await.is_none());
        mock.assert_async().await;
        assert_eq!(metrics.get_metrics().video_searches_empty, 1);
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_api_key() {
        let client = VideoSearchClient::new(test_config("http://127.0.0.1:1".to_string(), None)).unwrap();
        let key = Secret::new("super-secret-youtube-key".to_string());

        let err = client
            .search_once(&key, "calculus", VideoDuration::default(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, YoutubeError::NetworkError(_)));
        assert!(!err.to_string().contains("super-secret-youtube-key"));
    }
}
