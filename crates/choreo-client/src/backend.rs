//! Backend trait: every call the session engine makes to the pose server.

use async_trait::async_trait;

use choreo_core::{FeedbackSample, GroundTruthStore, PlaybackMode, Result};

/// Endpoint paths, shared by the HTTP client and the scripted backend
pub mod endpoints {
    use choreo_core::{Error, Result};

    pub const FEEDBACK: &str = "/feedback";
    pub const START_PROCESSING: &str = "/start_processing";
    pub const STOP_PROCESSING: &str = "/stop_processing";
    pub const RESET_FEEDBACK: &str = "/reset_feedback";
    pub const CLEAR_SAVED_FRAMES: &str = "/clear_saved_frames";
    pub const VIDEO_FEED: &str = "/video_feed";
    pub const LIST_SAVED_FRAMES: &str = "/list_saved_frames";
    pub const HUMANIZE_FEEDBACK: &str = "/humanize_feedback";
    pub const PROCESS_TIKTOK: &str = "/process_tiktok";

    /// Keypoint file path. Ids are used as a path segment, so only ASCII
    /// letters, digits, `_`, `-` and `.` are accepted.
    pub fn keypoints(video_id: &str) -> Result<String> {
        let valid = !video_id.is_empty()
            && video_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(Error::InvalidVideoId(video_id.to_string()));
        }
        Ok(format!("/keypoints/{}-keypoints.json", video_id))
    }
}

/// Pose-scoring backend consumed by the session engine
#[async_trait]
pub trait Backend: Send + Sync {
    /// Current feedback classification
    async fn feedback(&self) -> Result<FeedbackSample>;

    /// Begin scoring webcam frames against the reference
    async fn start_processing(&self, mode: PlaybackMode) -> Result<()>;

    async fn stop_processing(&self) -> Result<()>;

    async fn reset_feedback(&self) -> Result<()>;

    /// Purge user-pose screenshots captured by a previous attempt
    async fn clear_saved_frames(&self) -> Result<()>;

    /// Ground-truth keypoints of a reference video
    async fn keypoints(&self, video_id: &str) -> Result<GroundTruthStore>;

    /// Paths of captured user-pose screenshots, in capture order
    async fn list_saved_frames(&self) -> Result<Vec<String>>;

    /// Turn a feedback prompt into coach-style prose
    async fn humanize_feedback(&self, prompt: &str) -> Result<String>;

    /// Ingest a TikTok dance and return its reference video id
    async fn process_tiktok(&self, link: &str) -> Result<String>;

    /// Address of the annotated webcam stream, consumed as an image source
    fn video_feed_url(&self) -> String;

    /// Resolve a saved-frame path into something an image viewer can open
    fn saved_frame_url(&self, path: &str) -> String {
        path.to_string()
    }
}
