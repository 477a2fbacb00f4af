//! Data models for YouTube search results and captions

use serde::{Deserialize, Serialize};

/// Duration class accepted by the search API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDuration {
    Any,
    Short,
    #[default]
    Medium,
    Long,
}

impl VideoDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoDuration::Any => "any",
            VideoDuration::Short => "short",
            VideoDuration::Medium => "medium",
            VideoDuration::Long => "long",
        }
    }
}

/// Response from `search.list`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItemId {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

impl SearchResponse {
    /// Video id of the first result
    pub fn first_video_id(&self) -> Option<String> {
        self.items.first().and_then(|item| item.id.video_id.clone())
    }
}

/// One caption fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text
    pub text: String,

    /// Start of the fragment in seconds
    pub offset: f64,

    /// Length of the fragment in seconds
    pub duration: f64,
}

/// Caption track advertised by the watch page
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    #[serde(rename = "languageCode", default)]
    pub language_code: String,
}
