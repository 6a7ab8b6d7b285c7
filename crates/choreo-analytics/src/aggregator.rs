//! One-shot post-session aggregation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use choreo_client::Backend;
use choreo_core::{FeedbackLogEntry, GroundTruthStore};

use crate::config::AnalyticsConfig;
use crate::evidence::{pair_evidence, FrameEvidence};
use crate::prompts::format_summary_prompt;
use crate::scoring::ScoreSummary;
use crate::summary::NaturalSummary;
use crate::timeline::Timeline;

/// Everything shown on the post-session screen
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<FeedbackLogEntry>,
    pub score: ScoreSummary,
    pub timeline: Timeline,
    pub evidence: Vec<FrameEvidence>,
    /// `None` when the log was empty or the backend could not summarise it
    pub summary: Option<NaturalSummary>,
    /// Non-fatal problems met while building the report
    pub warnings: Vec<String>,
}

/// Aggregates a handed-over log. Consumed by [`finalize`](Self::finalize).
pub struct SessionAnalytics {
    entries: Vec<FeedbackLogEntry>,
    config: AnalyticsConfig,
}

impl SessionAnalytics {
    pub fn new(entries: Vec<FeedbackLogEntry>, config: AnalyticsConfig) -> Self {
        Self { entries, config }
    }

    pub fn entries(&self) -> &[FeedbackLogEntry] {
        &self.entries
    }

    pub fn score(&self) -> ScoreSummary {
        ScoreSummary::compute(&self.entries)
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::from_entries(&self.entries)
    }

    /// Build the report, fetching saved frames and the summary concurrently.
    /// Backend failures only add warnings.
    pub async fn finalize(
        self,
        backend: &dyn Backend,
        store: Option<&GroundTruthStore>,
    ) -> SessionReport {
        let mut warnings = Vec::new();

        let frames_request = async {
            if self.config.fetch_saved_frames {
                Some(backend.list_saved_frames().await)
            } else {
                None
            }
        };
        let summary_request = async {
            if self.config.humanize && !self.entries.is_empty() {
                let prompt = format_summary_prompt(&self.entries);
                Some(backend.humanize_feedback(&prompt).await)
            } else {
                None
            }
        };
        let (frames, summary) = futures::join!(frames_request, summary_request);

        let saved_frames = match frames {
            Some(Ok(frames)) => frames,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "saved frames unavailable");
                warnings.push(format!("Saved frames unavailable: {}", e));
                Vec::new()
            }
            None => Vec::new(),
        };

        let summary = match summary {
            Some(Ok(text)) => NaturalSummary::parse(&text),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "summary unavailable");
                warnings.push(format!("Summary unavailable: {}", e));
                None
            }
            None => None,
        };

        let evidence = pair_evidence(&self.entries, &saved_frames, store, |p| {
            backend.saved_frame_url(p)
        });
        let score = self.score();
        let timeline = self.timeline();
        tracing::info!(
            entries = self.entries.len(),
            good = score.good_percentage,
            frames = saved_frames.len(),
            summarised = summary.is_some(),
            "session report ready"
        );

        SessionReport {
            generated_at: Utc::now(),
            entries: self.entries,
            score,
            timeline,
            evidence,
            summary,
            warnings,
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session report ({})", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(
            f,
            "Good: {}%   Needs improvement: {}%   ({} entries)",
            self.score.good_percentage,
            self.score.needs_improvement,
            self.entries.len()
        )?;
        writeln!(f, "Timeline: [{}]", self.timeline)?;

        if let Some(summary) = &self.summary {
            writeln!(f)?;
            write!(f, "{}", summary)?;
        }

        if !self.evidence.is_empty() {
            writeln!(f)?;
            for item in &self.evidence {
                write!(f, "{:>4}s  {}", item.elapsed_seconds, item.feedback)?;
                if let Some(frame) = &item.saved_frame {
                    write!(f, "  [{}]", frame)?;
                }
                writeln!(f)?;
            }
        }

        for warning in &self.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        Ok(())
    }
}
