//! Shared types used across modules
//!
//! The conversation transcript lives here so that both the session
//! controller and the shells can speak about it without depending on
//! each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a line of the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    /// Label printed in front of a line
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Bot => "Bot",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single line in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatLine {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for ChatLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// Ordered conversation history for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    lines: Vec<ChatLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: ChatLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop every line (the "Clear" action)
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines rendered as `Speaker: text`, one per line
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
