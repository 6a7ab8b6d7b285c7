//! Session score.

use serde::Serialize;

use choreo_core::{FeedbackCategory, FeedbackLogEntry};

/// Entries per feedback category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub positive: usize,
    pub neutral: usize,
    pub corrective: usize,
}

impl CategoryCounts {
    pub fn from_entries(entries: &[FeedbackLogEntry]) -> Self {
        entries
            .iter()
            .fold(CategoryCounts::default(), |mut counts, entry| {
                match entry.category() {
                    FeedbackCategory::Positive => counts.positive += 1,
                    FeedbackCategory::Neutral => counts.neutral += 1,
                    FeedbackCategory::Corrective => counts.corrective += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.corrective
    }
}

/// Share of positive entries, as whole percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub good_percentage: u8,
    pub needs_improvement: u8,
    pub counts: CategoryCounts,
}

impl ScoreSummary {
    /// `good = round(100 * positive / total)`, `needs_improvement = 100 - good`.
    /// An empty log scores 0.
    pub fn compute(entries: &[FeedbackLogEntry]) -> Self {
        let counts = CategoryCounts::from_entries(entries);
        let good_percentage = match counts.total() {
            0 => 0,
            total => (100.0 * counts.positive as f64 / total as f64).round() as u8,
        };
        Self {
            good_percentage,
            needs_improvement: 100 - good_percentage,
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(feedback: &[&str]) -> Vec<FeedbackLogEntry> {
        feedback
            .iter()
            .enumerate()
            .map(|(i, f)| FeedbackLogEntry::new(i as u64, *f))
            .collect()
    }

    #[test]
    fn test_two_of_three() {
        let score = ScoreSummary::compute(&log(&["Perfect pose", "Pose Not Detected", "Perfect pose"]));
        assert_eq!(score.good_percentage, 67);
        assert_eq!(score.needs_improvement, 33);
        assert_eq!(score.counts.neutral, 1);
    }

    #[test]
    fn test_empty_log() {
        let score = ScoreSummary::compute(&[]);
        assert_eq!(score.good_percentage, 0);
        assert_eq!(score.needs_improvement, 100);
    }

    #[test]
    fn test_always_sums_to_hundred() {
        for n in 1..=12 {
            for positive in 0..=n {
                let feedback: Vec<&str> = (0..n)
                    .map(|i| if i < positive { "Perfect!" } else { "Bend your knees" })
                    .collect();
                let score = ScoreSummary::compute(&log(&feedback));
                assert_eq!(score.good_percentage as u32 + score.needs_improvement as u32, 100);
            }
        }
    }
}
