//! # Choreo-Analytics
//!
//! Turns the feedback log of a finished attempt into a reviewable report:
//! a score, a colour-coded timeline, per-entry frame evidence and a
//! coach-style summary from the backend.

pub mod aggregator;
pub mod config;
pub mod evidence;
pub mod prompts;
pub mod scoring;
pub mod summary;
pub mod timeline;

pub use aggregator::{SessionAnalytics, SessionReport};
pub use config::AnalyticsConfig;
pub use evidence::FrameEvidence;
pub use scoring::{CategoryCounts, ScoreSummary};
pub use summary::NaturalSummary;
pub use timeline::{Timeline, TimelineSegment};
