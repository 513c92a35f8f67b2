//! Question/answer knowledge base
//!
//! An ordered list of question/answer pairs. Entries are only ever appended;
//! nothing edits or removes an existing pair. Duplicate questions are legal
//! and lookups resolve to the first one in insertion order.

pub mod store;

use serde::{Deserialize, Serialize};

pub use store::{init, load, save, JsonFileStore, KnowledgeStore, StorageError};

/// One question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// The full ordered collection of entries for a session.
///
/// Serializes as `{"questions": [{"question": ..., "answer": ...}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(rename = "questions")]
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Question texts in insertion order
    pub fn questions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.question.as_str()).collect()
    }

    /// Answer of the first entry whose question equals `question` exactly
    pub fn answer_for(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.question == question)
            .map(|e| e.answer.as_str())
    }

    /// Append a pair at the end
    pub fn append(&mut self, entry: KnowledgeEntry) {
        self.entries.push(entry);
    }
}
