//! Colour-coded progress strip.

use serde::Serialize;
use std::fmt;

use choreo_core::{FeedbackCategory, FeedbackLogEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment {
    pub elapsed_seconds: u64,
    pub category: FeedbackCategory,
    pub color: &'static str,
    /// Share of the strip, in percent
    pub width_percent: f64,
}

/// One equal-width segment per log entry, in log order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    segments: Vec<TimelineSegment>,
}

impl Timeline {
    pub fn from_entries(entries: &[FeedbackLogEntry]) -> Self {
        let width_percent = if entries.is_empty() {
            0.0
        } else {
            100.0 / entries.len() as f64
        };
        let segments = entries
            .iter()
            .map(|entry| {
                let category = entry.category();
                TimelineSegment {
                    elapsed_seconds: entry.elapsed_seconds,
                    category,
                    color: category.color(),
                    width_percent,
                }
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn glyph(category: FeedbackCategory) -> char {
    match category {
        FeedbackCategory::Positive => '+',
        FeedbackCategory::Neutral => '.',
        FeedbackCategory::Corrective => '!',
    }
}

/// Text strip, one glyph per segment: `+` positive, `.` neutral, `!` corrective.
impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.segments
            .iter()
            .try_for_each(|s| write!(f, "{}", glyph(s.category)))
    }
}
