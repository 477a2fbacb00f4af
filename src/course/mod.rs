//! Chapter content pipeline: video, transcript, then questions

use crate::questions::{Question, QuestionGenerator};
use crate::youtube::{TranscriptFetcher, VideoSearchClient};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a chapter page needs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChapterContent {
    /// Video backing the chapter, `None` when the search found nothing
    pub video_id: Option<String>,
    pub transcript: String,
    pub questions: Vec<Question>,
}

impl ChapterContent {
    /// A chapter without a video has nothing to show
    pub fn is_empty(&self) -> bool {
        self.video_id.is_none()
    }
}

/// Composes video search, transcript retrieval and question generation
pub struct ChapterContentService {
    search: Arc<VideoSearchClient>,
    transcripts: Arc<TranscriptFetcher>,
    questions: Arc<QuestionGenerator>,
}

impl ChapterContentService {
    pub fn new(
        search: Arc<VideoSearchClient>,
        transcripts: Arc<TranscriptFetcher>,
        questions: Arc<QuestionGenerator>,
    ) -> Self {
        Self {
            search,
            transcripts,
            questions,
        }
    }

    /// Build the content for one chapter.
    ///
    /// Stops early with an empty result when no video is found. A video
    /// without a transcript still yields the video id, just no questions.
    pub async fn build(&self, youtube_query: &str, course_title: &str, num_questions: usize) -> ChapterContent {
        let Some(video_id) = self.search.search_default(youtube_query).await else {
            warn!("No video found for chapter query {:?}", youtube_query);
            return ChapterContent::default();
        };

        let transcript = self.transcripts.fetch(&video_id).await;
        let questions = if transcript.is_empty() {
            Vec::new()
        } else {
            self.questions.generate(&transcript, course_title, num_questions).await
        };

        info!(
            "Chapter content for {:?}: video={}, transcript_chars={}, questions={}",
            youtube_query,
            video_id,
            transcript.chars().count(),
            questions.len()
        );

        ChapterContent {
            video_id: Some(video_id),
            transcript,
            questions,
        }
    }
}
