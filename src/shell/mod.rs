//! Presentation shells
//!
//! A shell renders the conversation and collects input. The session
//! controller only ever talks to it through the [`Shell`] trait, so the same
//! controller runs behind a full terminal editor, a plain reader/writer pair,
//! or a scripted fake in tests.

pub mod line;
pub mod terminal;

pub use line::LineShell;
pub use terminal::TerminalShell;

use crate::knowledge::KnowledgeStore;
use crate::session::{SessionController, TurnOutcome};

/// Line that asks the shell to clear the conversation
pub const CLEAR_COMMAND: &str = "/clear";

/// Something the user did at the input prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// A line was submitted
    Submit(String),
    /// The user asked for the conversation to be cleared
    Clear,
    /// Input is exhausted (EOF, closed window)
    Closed,
}

impl ShellEvent {
    /// Classify a raw input line
    pub fn from_line(line: &str) -> Self {
        if line.trim() == CLEAR_COMMAND {
            ShellEvent::Clear
        } else {
            ShellEvent::Submit(line.to_string())
        }
    }
}

/// Capabilities the session controller needs from whatever is showing the chat
pub trait Shell {
    /// Block until the user does something
    fn next_event(&mut self) -> ShellEvent;

    fn render_user_line(&mut self, text: &str);

    fn render_bot_line(&mut self, text: &str);

    /// Bot line that reports a problem; plain bot line unless the shell can
    /// make it stand out
    fn render_warning(&mut self, text: &str) {
        self.render_bot_line(text);
    }

    /// Ask a yes/no question. Cancelling counts as "no".
    fn prompt_yes_no(&mut self, title: &str, message: &str) -> bool;

    /// Ask for free text. `None` when the user cancels.
    fn prompt_text(&mut self, title: &str, message: &str) -> Option<String>;

    /// Wipe the rendered conversation
    fn clear(&mut self) {}
}

/// Feed shell events to the controller until the session ends or input runs out
pub fn run_session<S: KnowledgeStore>(
    controller: &mut SessionController<S>,
    shell: &mut dyn Shell,
) {
    loop {
        match shell.next_event() {
            ShellEvent::Submit(text) => {
                if controller.handle_input(&text, shell) == TurnOutcome::Terminated {
                    break;
                }
            }
            ShellEvent::Clear => controller.clear_history(shell),
            ShellEvent::Closed => break,
        }
    }
}
