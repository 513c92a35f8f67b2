//! Session controller
//!
//! Runs one conversational turn at a time: classify the input, fuzzy-match it
//! against the known questions, answer on a hit, and on a miss offer the user
//! the chance to teach a new answer. Taught answers are appended to the
//! knowledge base and the whole base is saved immediately.
//!
//! A failed save is reported to the user but the in-memory entry is kept, so
//! the session remembers the answer even though the file may not.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::knowledge::{KnowledgeBase, KnowledgeEntry, KnowledgeStore, StorageError};
use crate::matcher::Matcher;
use crate::shell::Shell;
use crate::types::{ChatLine, Transcript};

/// Title shown on every bot prompt
pub const BOT_TITLE: &str = "Bot";
pub const TEACH_PROMPT: &str = "I don't know the answer, would you like to teach me?";
pub const ANSWER_PROMPT: &str = "Type the answer:";
pub const LEARNED_ACK: &str = "Thank you! I have learned a new response.";

/// Where the controller is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next user turn
    Idle,
    /// Input received, being classified
    AwaitingInput,
    /// Looking for the closest known question
    Matching,
    /// A known answer was emitted
    Answered,
    /// No match; asking whether the user wants to teach one
    TeachPrompt,
    /// Collecting the new answer text
    TeachCollecting,
    /// The quit command was seen; no further turns are processed
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingInput => write!(f, "awaiting-input"),
            SessionState::Matching => write!(f, "matching"),
            SessionState::Answered => write!(f, "answered"),
            SessionState::TeachPrompt => write!(f, "teach-prompt"),
            SessionState::TeachCollecting => write!(f, "teach-collecting"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// What a single turn ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// The quit command ended the session
    Terminated,
    /// A known question matched
    Answered { question: String, answer: String },
    /// No match and the user chose not to teach
    Declined,
    /// No match, the user agreed to teach but gave no answer
    Discarded,
    /// A new pair was appended and saved
    Learned,
    /// A new pair was appended but saving it failed
    LearnedUnsaved { error: String },
}

/// Input that cannot start a turn
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("input is empty")]
    Empty,
}

/// A classified line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Query(String),
}

/// Trim `raw` and decide whether it is the quit command or a query
pub fn parse_input(raw: &str, quit_command: &str) -> Result<Input, InputError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(InputError::Empty);
    }
    if text.to_lowercase() == quit_command.trim().to_lowercase() {
        return Ok(Input::Quit);
    }
    Ok(Input::Query(text.to_string()))
}

/// Owns the knowledge base for one session and drives each turn
pub struct SessionController<S: KnowledgeStore> {
    knowledge: KnowledgeBase,
    store: S,
    matcher: Matcher,
    quit_command: String,
    transcript: Transcript,
    state: SessionState,
}

impl<S: KnowledgeStore> SessionController<S> {
    /// Load the knowledge base from `store` and start idle.
    ///
    /// A load failure means there is nothing to converse about, so it is
    /// returned to the caller instead of starting an empty session.
    pub fn new(store: S, matcher: Matcher) -> Result<Self, StorageError> {
        let knowledge = store.load()?;
        Ok(Self::with_knowledge(store, knowledge, matcher))
    }

    /// Start from an already loaded knowledge base
    pub fn with_knowledge(store: S, knowledge: KnowledgeBase, matcher: Matcher) -> Self {
        Self {
            knowledge,
            store,
            matcher,
            quit_command: "quit".to_string(),
            transcript: Transcript::new(),
            state: SessionState::Idle,
        }
    }

    pub fn with_quit_command(mut self, quit_command: impl Into<String>) -> Self {
        self.quit_command = quit_command.into();
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Closest known entry for `query` under the current knowledge base.
    ///
    /// Matching is fuzzy, but the answer comes from the first entry whose
    /// question equals the winning candidate exactly.
    pub fn lookup(&self, query: &str) -> Option<KnowledgeEntry> {
        let questions = self.knowledge.questions();
        let question = self.matcher.best_match(query, &questions)?;
        self.knowledge
            .answer_for(question)
            .map(|answer| KnowledgeEntry::new(question, answer))
    }

    fn say(&mut self, shell: &mut dyn Shell, text: &str) {
        self.transcript.push(ChatLine::bot(text));
        shell.render_bot_line(text);
    }

    /// Process one submitted line
    pub fn handle_input(&mut self, raw: &str, shell: &mut dyn Shell) -> TurnOutcome {
        if self.is_terminated() {
            return TurnOutcome::Terminated;
        }

        self.transition(SessionState::AwaitingInput);
        let query = match parse_input(raw, &self.quit_command) {
            Ok(Input::Quit) => {
                info!("Quit command received; ending session");
                self.transition(SessionState::Terminated);
                return TurnOutcome::Terminated;
            }
            Ok(Input::Query(query)) => query,
            Err(e) => {
                debug!("Ignoring turn: {}", e);
                self.transition(SessionState::Idle);
                return TurnOutcome::Ignored;
            }
        };

        self.transcript.push(ChatLine::user(&query));
        shell.render_user_line(&query);

        self.transition(SessionState::Matching);
        let outcome = match self.lookup(&query) {
            Some(entry) => {
                self.transition(SessionState::Answered);
                self.say(shell, &entry.answer);
                TurnOutcome::Answered {
                    question: entry.question,
                    answer: entry.answer,
                }
            }
            None => self.teach(query, shell),
        };

        self.transition(SessionState::Idle);
        outcome
    }

    fn teach(&mut self, question: String, shell: &mut dyn Shell) -> TurnOutcome {
        self.transition(SessionState::TeachPrompt);
        if !shell.prompt_yes_no(BOT_TITLE, TEACH_PROMPT) {
            debug!("User declined to teach an answer for {:?}", question);
            return TurnOutcome::Declined;
        }

        self.transition(SessionState::TeachCollecting);
        let answer = match shell.prompt_text(BOT_TITLE, ANSWER_PROMPT) {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                debug!("No answer given for {:?}; nothing stored", question);
                return TurnOutcome::Discarded;
            }
        };

        self.knowledge.append(KnowledgeEntry::new(question, answer));

        match self.store.save(&self.knowledge) {
            Ok(()) => {
                info!("Learned new response ({} entries)", self.knowledge.len());
                self.say(shell, LEARNED_ACK);
                TurnOutcome::Learned
            }
            Err(e) => {
                warn!("Failed to save knowledge base to {}: {}", self.store.location(), e);
                let warning = format!(
                    "Warning: I could not save that answer ({}). It is remembered for this session only.",
                    e
                );
                self.transcript.push(ChatLine::bot(&warning));
                shell.render_warning(&warning);
                TurnOutcome::LearnedUnsaved {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Forget the on-screen conversation; the knowledge base is untouched
    pub fn clear_history(&mut self, shell: &mut dyn Shell) {
        debug!("Clearing {} transcript lines", self.transcript.len());
        self.transcript.clear();
        shell.clear();
    }
}
