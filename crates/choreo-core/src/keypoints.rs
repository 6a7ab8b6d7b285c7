//! Ground-truth keypoint store for the reference dance video.
//!
//! The keypoint file is a JSON array with one object per video frame, each
//! mapping a joint name to `[x, y, z, ...]` in normalised coordinates:
//!
//! ```json
//! [{"0": [0.51, 0.22, -0.3], "11": [0.45, 0.40, 0.1]}, ...]
//! ```
//!
//! Only `x` and `y` are kept. A `null` joint is treated as missing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::geometry::NormalizedPoint;

/// Sample rate the keypoint extractor writes frames at
pub const DEFAULT_SAMPLE_RATE: f64 = 30.0;

/// Largest coordinate magnitude accepted from a keypoint file. Normalised
/// joints sit near [0, 1]; anything far outside is a corrupt payload.
pub const MAX_COORDINATE: f64 = 10.0;

/// Wire form of one joint: `[x, y, ...]`
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct RawJoint(NormalizedPoint);

impl TryFrom<Vec<f64>> for RawJoint {
    type Error = String;

    fn try_from(values: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y, ..] if !x.is_finite() || !y.is_finite() => {
                Err("joint coordinates must be finite".to_string())
            }
            [x, y, ..] if x.abs() > MAX_COORDINATE || y.abs() > MAX_COORDINATE => Err(format!(
                "joint coordinates ({}, {}) are outside +/-{}",
                x, y, MAX_COORDINATE
            )),
            [x, y, ..] => Ok(RawJoint(NormalizedPoint::new(*x, *y))),
            _ => Err(format!(
                "joint needs at least 2 coordinates, got {}",
                values.len()
            )),
        }
    }
}

/// Joint positions of one reference video frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<RawJoint>>",
    into = "BTreeMap<String, [f64; 2]>"
)]
pub struct GroundTruthFrame {
    joints: BTreeMap<String, NormalizedPoint>,
}

impl From<BTreeMap<String, Option<RawJoint>>> for GroundTruthFrame {
    fn from(raw: BTreeMap<String, Option<RawJoint>>) -> Self {
        let joints = raw
            .into_iter()
            .filter_map(|(name, joint)| joint.map(|RawJoint(p)| (name, p)))
            .collect();
        Self { joints }
    }
}

impl From<GroundTruthFrame> for BTreeMap<String, [f64; 2]> {
    fn from(frame: GroundTruthFrame) -> Self {
        frame
            .joints
            .into_iter()
            .map(|(name, p)| (name, [p.x, p.y]))
            .collect()
    }
}

impl GroundTruthFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joint(mut self, name: impl Into<String>, point: NormalizedPoint) -> Self {
        self.joints.insert(name.into(), point);
        self
    }

    pub fn joint(&self, name: &str) -> Option<NormalizedPoint> {
        self.joints.get(name).copied()
    }

    pub fn joints(&self) -> impl Iterator<Item = (&str, NormalizedPoint)> {
        self.joints.iter().map(|(name, p)| (name.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Ordered, fixed-rate sequence of ground-truth frames
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthStore {
    frames: Vec<GroundTruthFrame>,
    sample_rate: f64,
}

impl GroundTruthStore {
    pub fn new(frames: Vec<GroundTruthFrame>) -> Self {
        Self {
            frames,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Store with no frames; the overlay draws video only.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Decode a keypoint payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let frames: Vec<GroundTruthFrame> = serde_json::from_slice(bytes)
            .map_err(|e| Error::DataFormat(format!("invalid keypoint payload: {}", e)))?;
        tracing::debug!(frames = frames.len(), "decoded ground-truth keypoints");
        Ok(Self::new(frames))
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at a signed index; negative or past-the-end indices yield `None`.
    pub fn frame(&self, index: i64) -> Option<&GroundTruthFrame> {
        usize::try_from(index).ok().and_then(|i| self.frames.get(i))
    }

    /// Frame index for a playback time at the store's sample rate.
    pub fn index_at(&self, seconds: f64) -> i64 {
        (seconds * self.sample_rate).floor() as i64
    }

    /// Length of the covered reference footage in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate
    }

    /// Union of joint names seen across all frames
    pub fn joint_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .frames
            .iter()
            .flat_map(|f| f.joints.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for GroundTruthStore {
    fn default() -> Self {
        Self::empty()
    }
}
