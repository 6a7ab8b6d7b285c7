//! Coach-style summary returned by the backend.

use serde::Serialize;
use std::fmt;

/// Separator between the introduction and each bullet item
pub const BULLET: char = '•';

/// Introductory sentence plus bullet items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NaturalSummary {
    pub intro: String,
    pub bullets: Vec<String>,
}

impl NaturalSummary {
    /// Split humanised text on [`BULLET`]: the first piece is the
    /// introduction, every other non-blank piece a bullet. Blank text
    /// yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut pieces = text.split(BULLET).map(str::trim);
        let intro = pieces.next().unwrap_or_default().to_string();
        let bullets: Vec<String> = pieces
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if intro.is_empty() && bullets.is_empty() {
            None
        } else {
            Some(Self { intro, bullets })
        }
    }
}

impl fmt::Display for NaturalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.intro.is_empty() {
            writeln!(f, "{}", self.intro)?;
        }
        for bullet in &self.bullets {
            writeln!(f, "  {} {}", BULLET, bullet)?;
        }
        Ok(())
    }
}
