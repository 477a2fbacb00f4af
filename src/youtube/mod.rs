//! YouTube collaborators: video search and caption transcripts

pub mod captions;
pub mod models;
pub mod search;
pub mod transcript;

pub use captions::{CaptionSource, YoutubeCaptionClient};
pub use models::{TranscriptSegment, VideoDuration};
pub use search::VideoSearchClient;
pub use transcript::TranscriptFetcher;
