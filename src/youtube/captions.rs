//! Caption retrieval from the YouTube watch page and timed-text endpoint

use super::models::{CaptionTrack, TranscriptSegment};
use crate::config::TranscriptConfig;
use crate::error::{Result, TranscriptError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{header, Client, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36";

/// `<text start=".." dur="..">..</text>` elements of a timed-text document
static TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text start="([^"]*)"(?: dur="([^"]*)")?[^>]*>(.*?)</text>"#)
        .expect("timed text pattern is valid")
});

/// Source of caption fragments for a video
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Caption fragments in timeline order; an empty list means no captions
    async fn fetch_segments(
        &self,
        video_id: &str,
        language: &str,
        country: &str,
    ) -> std::result::Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Scrapes caption tracks the way a browser discovers them
pub struct YoutubeCaptionClient {
    watch_url: String,
    http_client: Client,
}

impl YoutubeCaptionClient {
    pub fn new(config: &TranscriptConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(TranscriptError::from)?;

        Ok(Self {
            watch_url: config.watch_url.clone(),
            http_client,
        })
    }

    async fn caption_tracks(
        &self,
        video_id: &str,
        language: &str,
        country: &str,
    ) -> std::result::Result<Vec<CaptionTrack>, TranscriptError> {
        let response = self
            .http_client
            .get(&self.watch_url)
            .query(&[("v", video_id), ("hl", language), ("gl", country)])
            .header(header::ACCEPT_LANGUAGE, language)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptError::TooManyRequests);
        }

        let html = response.error_for_status()?.text().await?;
        extract_caption_tracks(&html, video_id)
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionClient {
    async fn fetch_segments(
        &self,
        video_id: &str,
        language: &str,
        country: &str,
    ) -> std::result::Result<Vec<TranscriptSegment>, TranscriptError> {
        let tracks = self.caption_tracks(video_id, language, country).await?;
        let track = select_track(&tracks, language)
            .ok_or_else(|| TranscriptError::LanguageUnavailable(language.to_string()))?;

        debug!("Fetching {} captions for {}", track.language_code, video_id);

        let xml = self
            .http_client
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_timed_text(&xml))
    }
}

/// Pull the caption track list out of the watch page's player response
pub fn extract_caption_tracks(
    html: &str,
    video_id: &str,
) -> std::result::Result<Vec<CaptionTrack>, TranscriptError> {
    let Some((_, after)) = html.split_once("\"captions\":") else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::TooManyRequests);
        }
        if !html.contains("\"playabilityStatus\":") {
            return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
        }
        return Err(TranscriptError::Disabled(video_id.to_string()));
    };

    let captions_json = after
        .split_once(",\"videoDetails")
        .map(|(head, _)| head)
        .unwrap_or(after);

    let captions: serde_json::Value = serde_json::from_str(captions_json)
        .map_err(|e| TranscriptError::Malformed(e.to_string()))?;

    let tracks = captions
        .pointer("/playerCaptionsTracklistRenderer/captionTracks")
        .cloned()
        .ok_or_else(|| TranscriptError::Disabled(video_id.to_string()))?;

    serde_json::from_value(tracks).map_err(|e| TranscriptError::Malformed(e.to_string()))
}

/// Exact language match first, then a regional variant such as `en-GB`
fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code.eq_ignore_ascii_case(language))
        .or_else(|| {
            let prefix = format!("{}-", language.to_lowercase());
            tracks
                .iter()
                .find(|t| t.language_code.to_lowercase().starts_with(&prefix))
        })
}

/// Parse a timed-text XML document into segments
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .map(|caps| TranscriptSegment {
            offset: caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0),
            duration: caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0),
            text: decode_entities(&decode_entities(caps.get(3).map(|m| m.as_str()).unwrap_or_default())),
        })
        .collect()
}

/// Decode the XML entities YouTube uses in caption text
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let decoded = tail.find(';').and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn watch_page(base_url: &str) -> String {
        format!(
            r#"<html><script>var ytInitialPlayerResponse = {{"playabilityStatus":{{"status":"OK"}},"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}","languageCode":"de"}},{{"baseUrl":"{}","languageCode":"en"}}]}}}},"videoDetails":{{"videoId":"abc"}}}};</script></html>"#,
            format!("{}/timedtext?lang=de", base_url),
            format!("{}/timedtext?lang=en", base_url),
        )
    }

    #[test]
    fn test_parse_timed_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="2.1">Hello &amp;amp; welcome</text><text start="2.6" dur="3">it&amp;#39;s
time</text></transcript>"#;

        let segments = parse_timed_text(xml);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello & welcome");
        assert_eq!(segments[0].offset, 0.5);
        assert_eq!(segments[0].duration, 2.1);
        assert_eq!(segments[1].text, "it's\ntime");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#39;c&#x27; &unknown; &"), "a <b> 'c' &unknown; &");
    }

    #[test]
    fn test_extract_disabled_captions() {
        let html = r#"{"playabilityStatus":{"status":"OK"},"videoDetails":{}}"#;
        let err = extract_caption_tracks(html, "abc").unwrap_err();
        assert!(matches!(err, TranscriptError::Disabled(_)));
    }

    #[test]
    fn test_extract_unavailable_video() {
        let err = extract_caption_tracks("<html>gone</html>", "abc").unwrap_err();
        assert!(matches!(err, TranscriptError::VideoUnavailable(_)));
    }

    #[test]
    fn test_extract_captcha() {
        let err = extract_caption_tracks(r#"<div class="g-recaptcha"></div>"#, "abc").unwrap_err();
        assert!(matches!(err, TranscriptError::TooManyRequests));
    }

    #[test]
    fn test_select_track_prefers_exact_language() {
        let tracks = vec![
            CaptionTrack { base_url: "a".to_string(), language_code: "en-GB".to_string() },
            CaptionTrack { base_url: "b".to_string(), language_code: "en".to_string() },
        ];
        assert_eq!(select_track(&tracks, "en").unwrap().base_url, "b");
        assert_eq!(select_track(&tracks[..1], "en").unwrap().base_url, "a");
        assert!(select_track(&tracks, "fr").is_none());
    }

    #[tokio::test]
    async fn test_fetch_segments_from_watch_page() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/watch")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("v".into(), "abc".into()),
                Matcher::UrlEncoded("hl".into(), "en".into()),
            ]))
            .match_header("accept-language", "en")
            .with_status(200)
            .with_body(watch_page(&server.url()))
            .create_async()
            .await;
        let captions = server
            .mock("GET", "/timedtext")
            .match_query(Matcher::UrlEncoded("lang".into(), "en".into()))
            .with_status(200)
            .with_body(r#"<transcript><text start="0" dur="1">first</text><text start="1" dur="1">second</text></transcript>"#)
            .create_async()
            .await;

        let config = TranscriptConfig {
            watch_url: format!("{}/watch", server.url()),
            ..TranscriptConfig::default()
        };
        let client = YoutubeCaptionClient::new(&config).unwrap();
        let segments = client.fetch_segments("abc", "en", "EN").await.unwrap();

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        page.assert_async().await;
        captions.assert_async().await;
    }
}
