//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSavedFramesRequest {
    pub really_clear: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavedFramesResponse {
    #[serde(default)]
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanizeRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanizeResponse {
    #[serde(rename = "humanizedFeedback")]
    pub humanized_feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTiktokRequest {
    #[serde(rename = "tiktokLink")]
    pub tiktok_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTiktokResponse {
    pub video_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_fields() {
        let req = ProcessTiktokRequest {
            tiktok_link: "https://www.tiktok.com/@user/video/1".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "tiktokLink": "https://www.tiktok.com/@user/video/1" })
        );

        let resp: HumanizeResponse =
            serde_json::from_value(json!({ "humanizedFeedback": "Nice! • Keep arms up" })).unwrap();
        assert_eq!(resp.humanized_feedback, "Nice! • Keep arms up");
    }

    #[test]
    fn test_saved_frames_default() {
        let resp: SavedFramesResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.frames.is_empty());
    }
}
