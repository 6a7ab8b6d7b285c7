//! Append-only feedback log.

use serde::Serialize;

use choreo_core::{FeedbackCategory, FeedbackLogEntry, FeedbackSample};

/// Feedback transitions of one attempt, in time order.
///
/// An entry is only appended when its feedback differs from the previous
/// entry, and elapsed seconds never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeedbackLog {
    entries: Vec<FeedbackLogEntry>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition. Returns `false` when `feedback` repeats the
    /// last entry.
    pub fn append(&mut self, elapsed_seconds: u64, feedback: FeedbackSample) -> bool {
        let floor = match self.entries.last() {
            Some(last) if last.feedback == feedback => return false,
            Some(last) => last.elapsed_seconds,
            None => 0,
        };
        self.entries
            .push(FeedbackLogEntry::new(elapsed_seconds.max(floor), feedback));
        true
    }

    pub fn entries(&self) -> &[FeedbackLogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&FeedbackLogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self, category: FeedbackCategory) -> usize {
        self.entries
            .iter()
            .filter(|e| e.category() == category)
            .count()
    }

    pub fn to_vec(&self) -> Vec<FeedbackLogEntry> {
        self.entries.clone()
    }
}

impl From<Vec<FeedbackLogEntry>> for FeedbackLog {
    /// Rebuild a log, dropping entries that would break its ordering rules.
    fn from(entries: Vec<FeedbackLogEntry>) -> Self {
        let mut log = FeedbackLog::new();
        for entry in entries {
            log.append(entry.elapsed_seconds, entry.feedback);
        }
        log
    }
}
