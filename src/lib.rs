//! Teachbot Library
//!
//! A small chat bot built around a question/answer knowledge base:
//! - JSON file persistence of question/answer pairs
//! - Ratcliff/Obershelp fuzzy matching of free-text questions
//! - A session controller that answers, or asks to be taught, one turn at a time
//! - Terminal and plain line-oriented shells
//!
//! # Example
//!
//! ```ignore
//! use teachbot::{JsonFileStore, Matcher, SessionController, LineShell, run_session};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = JsonFileStore::new("knowledge_base.json");
//!     let mut controller = SessionController::new(store, Matcher::default())?;
//!     let mut shell = LineShell::new(std::io::stdin().lock(), std::io::stdout());
//!     run_session(&mut controller, &mut shell);
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod knowledge;
pub mod matcher;
pub mod session;
pub mod shell;
pub mod config;
pub mod cli;

pub use knowledge::{JsonFileStore, KnowledgeBase, KnowledgeEntry, KnowledgeStore, StorageError};

pub use matcher::{find_best_match, find_close_matches, similarity, MatchError, Matcher, ScoredMatch};

pub use session::{InputError, SessionController, SessionState, TurnOutcome};

pub use shell::{run_session, LineShell, Shell, ShellEvent, TerminalShell};

pub use config::Config;

pub use types::{ChatLine, Speaker, Transcript};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - question/answer chat bot", NAME, VERSION)
}
