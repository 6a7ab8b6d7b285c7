//! Per-entry frame evidence.

use serde::Serialize;

use choreo_core::{FeedbackCategory, FeedbackLogEntry, GroundTruthStore};

/// A log entry with the images that illustrate it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameEvidence {
    pub entry_index: usize,
    pub elapsed_seconds: u64,
    pub feedback: String,
    pub category: FeedbackCategory,
    /// User-pose screenshot captured by the backend, if one exists at this index
    pub saved_frame: Option<String>,
    /// Reference keypoint frame at the entry's time, if the store covers it
    pub reference_frame: Option<i64>,
}

/// Pair entry `i` with saved frame `i`.
///
/// Pairing is positional; entries beyond the saved-frame list get no image.
pub fn pair_evidence<F>(
    entries: &[FeedbackLogEntry],
    saved_frames: &[String],
    store: Option<&GroundTruthStore>,
    resolve: F,
) -> Vec<FrameEvidence>
where
    F: Fn(&str) -> String,
{
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let reference_frame = store.and_then(|s| {
                let index = s.index_at(entry.elapsed_seconds as f64);
                s.frame(index).map(|_| index)
            });
            FrameEvidence {
                entry_index: i,
                elapsed_seconds: entry.elapsed_seconds,
                feedback: entry.feedback.as_str().to_string(),
                category: entry.category(),
                saved_frame: saved_frames.get(i).map(|p| resolve(p)),
                reference_frame,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_core::{GroundTruthFrame, NormalizedPoint};

    #[test]
    fn test_pairs_by_index() {
        let entries = vec![
            FeedbackLogEntry::new(0, "Perfect!"),
            FeedbackLogEntry::new(1, "Lift your elbow"),
            FeedbackLogEntry::new(3, "Perfect!"),
        ];
        let frames = vec!["saved_frames/a.jpg".to_string(), "saved_frames/b.jpg".to_string()];
        let store = GroundTruthStore::new(vec![
            GroundTruthFrame::new().with_joint("0", NormalizedPoint::new(0.5, 0.5));
            60
        ]);

        let evidence = pair_evidence(&entries, &frames, Some(&store), |p| format!("http://h/{}", p));

        assert_eq!(evidence[0].saved_frame.as_deref(), Some("http://h/saved_frames/a.jpg"));
        assert_eq!(evidence[1].saved_frame.as_deref(), Some("http://h/saved_frames/b.jpg"));
        assert_eq!(evidence[2].saved_frame, None);

        assert_eq!(evidence[0].reference_frame, Some(0));
        assert_eq!(evidence[1].reference_frame, Some(30));
        // 3s is past the two seconds of keypoints
        assert_eq!(evidence[2].reference_frame, None);
    }
}
