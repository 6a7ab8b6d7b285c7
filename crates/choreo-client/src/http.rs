//! HTTP implementation of [`Backend`] on top of `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use choreo_core::{Error, FeedbackSample, GroundTruthStore, PlaybackMode, Result};

use crate::backend::{endpoints, Backend};
use crate::messages::{
    ClearSavedFramesRequest, FeedbackResponse, HumanizeRequest, HumanizeResponse,
    ProcessTiktokRequest, ProcessTiktokResponse, SavedFramesResponse,
};

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the pose server
    pub base_url: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Pose server reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_decode() {
            Error::DataFormat(format!("{} returned an unexpected body: {}", endpoint, e))
        } else {
            Error::network(endpoint, e)
        }
    }

    fn check_status(endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Response> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        Self::check_status(endpoint, response)
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Response> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        Self::check_status(endpoint, response)
    }

    async fn decode<T: DeserializeOwned>(&self, endpoint: &str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| self.transport_error(endpoint, e))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn feedback(&self) -> Result<FeedbackSample> {
        let response = self.get(endpoints::FEEDBACK, &[]).await?;
        let body: FeedbackResponse = self.decode(endpoints::FEEDBACK, response).await?;
        Ok(FeedbackSample::new(body.feedback))
    }

    async fn start_processing(&self, mode: PlaybackMode) -> Result<()> {
        let query: Vec<(&str, &str)> = mode.query_value().map(|m| ("mode", m)).into_iter().collect();
        self.get(endpoints::START_PROCESSING, &query).await?;
        tracing::debug!(?mode, "backend processing started");
        Ok(())
    }

    async fn stop_processing(&self) -> Result<()> {
        self.get(endpoints::STOP_PROCESSING, &[]).await?;
        Ok(())
    }

    async fn reset_feedback(&self) -> Result<()> {
        self.get(endpoints::RESET_FEEDBACK, &[]).await?;
        Ok(())
    }

    async fn clear_saved_frames(&self) -> Result<()> {
        self.post(
            endpoints::CLEAR_SAVED_FRAMES,
            &ClearSavedFramesRequest { really_clear: true },
        )
        .await?;
        Ok(())
    }

    async fn keypoints(&self, video_id: &str) -> Result<GroundTruthStore> {
        let endpoint = endpoints::keypoints(video_id)?;
        let response = self.get(&endpoint, &[]).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&endpoint, e))?;
        GroundTruthStore::from_json(&bytes)
    }

    async fn list_saved_frames(&self) -> Result<Vec<String>> {
        let response = self.get(endpoints::LIST_SAVED_FRAMES, &[]).await?;
        let body: SavedFramesResponse = self.decode(endpoints::LIST_SAVED_FRAMES, response).await?;
        Ok(body.frames)
    }

    async fn humanize_feedback(&self, prompt: &str) -> Result<String> {
        let request = HumanizeRequest {
            prompt: prompt.to_string(),
        };
        let response = self.post(endpoints::HUMANIZE_FEEDBACK, &request).await?;
        let body: HumanizeResponse = self.decode(endpoints::HUMANIZE_FEEDBACK, response).await?;
        Ok(body.humanized_feedback)
    }

    async fn process_tiktok(&self, link: &str) -> Result<String> {
        let request = ProcessTiktokRequest {
            tiktok_link: link.to_string(),
        };
        let response = self.post(endpoints::PROCESS_TIKTOK, &request).await?;
        let body: ProcessTiktokResponse = self.decode(endpoints::PROCESS_TIKTOK, response).await?;
        tracing::info!(video_id = %body.video_id, "reference video ingested");
        Ok(body.video_id)
    }

    fn video_feed_url(&self) -> String {
        self.url(endpoints::VIDEO_FEED)
    }

    fn saved_frame_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}
