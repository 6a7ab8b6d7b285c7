//! Scripted in-process backend.
//!
//! Records every call and answers from a script, so session scenarios can
//! run under a paused tokio clock without a pose server.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use choreo_core::{Error, FeedbackSample, GroundTruthStore, PlaybackMode, Result};

use crate::backend::{endpoints, Backend};

/// A call observed by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Feedback,
    StartProcessing(PlaybackMode),
    StopProcessing,
    ResetFeedback,
    ClearSavedFrames,
    Keypoints(String),
    ListSavedFrames,
    HumanizeFeedback(String),
    ProcessTiktok(String),
}

#[derive(Default)]
struct Script {
    /// Queued `/feedback` answers; `None` is a failed poll
    feedback: VecDeque<Option<String>>,
    /// Answer once the queue is drained; `None` fails every poll
    steady_feedback: Option<String>,
    feedback_latency: Duration,
    failing: HashSet<String>,
    keypoints: Option<Vec<u8>>,
    saved_frames: Vec<String>,
    humanized: String,
}

pub struct ScriptedBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                steady_feedback: Some("Pose Not Detected".to_string()),
                humanized: String::new(),
                ..Default::default()
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every poll with `text` once the queue is drained.
    pub fn with_feedback(self, text: &str) -> Self {
        self.set_feedback(text);
        self
    }

    pub fn set_feedback(&self, text: &str) {
        self.script.lock().steady_feedback = Some(text.to_string());
    }

    /// Fail every poll once the queue is drained.
    pub fn fail_feedback(&self) {
        self.script.lock().steady_feedback = None;
    }

    /// Queue poll answers; `None` entries fail that poll.
    pub fn queue_feedback<I>(&self, answers: I)
    where
        I: IntoIterator<Item = Option<&'static str>>,
    {
        let mut script = self.script.lock();
        script
            .feedback
            .extend(answers.into_iter().map(|a| a.map(str::to_string)));
    }

    pub fn with_feedback_latency(self, latency: Duration) -> Self {
        self.script.lock().feedback_latency = latency;
        self
    }

    /// Make an endpoint (e.g. `endpoints::STOP_PROCESSING`) fail until recovered.
    pub fn fail_endpoint(&self, endpoint: &str) {
        self.script.lock().failing.insert(endpoint.to_string());
    }

    pub fn recover_endpoint(&self, endpoint: &str) {
        self.script.lock().failing.remove(endpoint);
    }

    pub fn with_keypoints_json(self, json: &[u8]) -> Self {
        self.script.lock().keypoints = Some(json.to_vec());
        self
    }

    pub fn with_saved_frames<I, S>(self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script.lock().saved_frames = frames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_humanized(self, text: &str) -> Self {
        self.script.lock().humanized = text.to_string();
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &BackendCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn count_start_processing(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, BackendCall::StartProcessing(_)))
            .count()
    }

    /// Calls other than `/feedback` polls, in order.
    pub fn control_calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| **c != BackendCall::Feedback)
            .cloned()
            .collect()
    }

    fn record(&self, call: BackendCall, endpoint: &str) -> Result<()> {
        self.calls.lock().push(call);
        if self.script.lock().failing.contains(endpoint) {
            Err(Error::network(endpoint, "scripted failure"))
        } else {
            Ok(())
        }
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn feedback(&self) -> Result<FeedbackSample> {
        self.record(BackendCall::Feedback, endpoints::FEEDBACK)?;
        let (answer, latency) = {
            let mut script = self.script.lock();
            let answer = match script.feedback.pop_front() {
                Some(queued) => queued,
                None => script.steady_feedback.clone(),
            };
            (answer, script.feedback_latency)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        answer
            .map(FeedbackSample::new)
            .ok_or_else(|| Error::network(endpoints::FEEDBACK, "connection refused"))
    }

    async fn start_processing(&self, mode: PlaybackMode) -> Result<()> {
        self.record(BackendCall::StartProcessing(mode), endpoints::START_PROCESSING)
    }

    async fn stop_processing(&self) -> Result<()> {
        self.record(BackendCall::StopProcessing, endpoints::STOP_PROCESSING)
    }

    async fn reset_feedback(&self) -> Result<()> {
        self.record(BackendCall::ResetFeedback, endpoints::RESET_FEEDBACK)
    }

    async fn clear_saved_frames(&self) -> Result<()> {
        self.record(BackendCall::ClearSavedFrames, endpoints::CLEAR_SAVED_FRAMES)
    }

    async fn keypoints(&self, video_id: &str) -> Result<GroundTruthStore> {
        let endpoint = endpoints::keypoints(video_id)?;
        self.record(BackendCall::Keypoints(video_id.to_string()), &endpoint)?;
        let payload = self.script.lock().keypoints.clone();
        match payload {
            Some(bytes) => GroundTruthStore::from_json(&bytes),
            None => Err(Error::HttpStatus {
                endpoint,
                status: 404,
            }),
        }
    }

    async fn list_saved_frames(&self) -> Result<Vec<String>> {
        self.record(BackendCall::ListSavedFrames, endpoints::LIST_SAVED_FRAMES)?;
        Ok(self.script.lock().saved_frames.clone())
    }

    async fn humanize_feedback(&self, prompt: &str) -> Result<String> {
        self.record(
            BackendCall::HumanizeFeedback(prompt.to_string()),
            endpoints::HUMANIZE_FEEDBACK,
        )?;
        Ok(self.script.lock().humanized.clone())
    }

    async fn process_tiktok(&self, link: &str) -> Result<String> {
        self.record(
            BackendCall::ProcessTiktok(link.to_string()),
            endpoints::PROCESS_TIKTOK,
        )?;
        Ok("ingested".to_string())
    }

    fn video_feed_url(&self) -> String {
        format!("mock://{}", endpoints::VIDEO_FEED.trim_start_matches('/'))
    }
}
