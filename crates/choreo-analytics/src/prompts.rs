//! Prompt templates for the humanised summary.

use choreo_core::FeedbackLogEntry;

/// Instruction sent ahead of the feedback lines
pub const SUMMARY_INSTRUCTION: &str = r#"You are an encouraging dance coach. Below is the live feedback a dancer received while mirroring a reference video, one line per change, with the second it appeared.

Write one short introductory sentence about the attempt, then a few concrete tips. Separate the introduction and every tip with the "•" character. Do not use any other list markers."#;

/// Build the summary prompt from every log entry, in order.
pub fn format_summary_prompt(entries: &[FeedbackLogEntry]) -> String {
    let lines: Vec<String> = entries
        .iter()
        .map(|e| format!("[{}s] {}", e.elapsed_seconds, e.feedback))
        .collect();

    format!(
        r#"{}

=== SESSION FEEDBACK ===
{}"#,
        SUMMARY_INSTRUCTION,
        lines.join("\n")
    )
}
