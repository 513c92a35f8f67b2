//! Interactive terminal shell
//!
//! Line editing and history come from rustyline; colors from crossterm.
//! The editor already echoes what the user typed after the `You:` prompt,
//! so user lines are not printed a second time.

use std::io;

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use super::{Shell, ShellEvent, CLEAR_COMMAND};

const INPUT_PROMPT: &str = "You: ";

/// Print colored output
fn print_colored(text: &str, color: Color) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(color),
        Print(text),
        ResetColor
    );
}

/// Print a dimmed line
fn print_dim(text: &str) {
    print_colored(text, Color::DarkGrey);
}

/// Print an error message
fn print_error(text: &str) {
    print_colored(text, Color::Red);
}

pub struct TerminalShell {
    editor: Editor<(), DefaultHistory>,
}

impl TerminalShell {
    pub fn new() -> Result<Self> {
        let config = rustyline::Config::builder()
            .edit_mode(rustyline::EditMode::Emacs)
            .auto_add_history(false)
            .build();
        let editor = Editor::<(), DefaultHistory>::with_config(config)?;
        Ok(Self { editor })
    }

    /// Title line and usage hints
    pub fn print_banner(&self, entries: usize, quit_command: &str) {
        print_colored("Chat Bot\n", Color::Cyan);
        print_dim(&format!(
            "{} known questions. Type '{}' to leave, {} to clear the conversation.\n\n",
            entries, quit_command, CLEAR_COMMAND
        ));
    }
}

impl Shell for TerminalShell {
    fn next_event(&mut self) -> ShellEvent {
        loop {
            match self.editor.readline(INPUT_PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.trim());
                    }
                    return ShellEvent::from_line(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => return ShellEvent::Closed,
                Err(err) => {
                    print_error(&format!("Error: {}\n", err));
                    return ShellEvent::Closed;
                }
            }
        }
    }

    fn render_user_line(&mut self, _text: &str) {}

    fn render_bot_line(&mut self, text: &str) {
        print_colored("Bot: ", Color::Cyan);
        println!("{}", text);
    }

    fn render_warning(&mut self, text: &str) {
        print_colored("Bot: ", Color::Cyan);
        print_error(&format!("{}\n", text));
    }

    fn prompt_yes_no(&mut self, title: &str, message: &str) -> bool {
        let prompt = format!("{}: {} [y/n] ", title, message);
        loop {
            match self.editor.readline(&prompt) {
                Ok(reply) => match reply.trim().to_lowercase().as_str() {
                    "y" | "yes" => return true,
                    "n" | "no" => return false,
                    _ => print_dim("Please enter y or n.\n"),
                },
                Err(_) => return false,
            }
        }
    }

    fn prompt_text(&mut self, title: &str, message: &str) -> Option<String> {
        self.editor.readline(&format!("{}: {} ", title, message)).ok()
    }

    fn clear(&mut self) {
        let _ = execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0));
    }
}
