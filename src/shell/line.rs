//! Plain line-oriented shell over any reader and writer.
//!
//! Used when stdin is not a terminal (piped input) and by tests.

use std::io::{BufRead, Write};

use tracing::warn;

use super::{Shell, ShellEvent};

pub struct LineShell<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineShell<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer, e.g. to inspect what was printed
    pub fn into_output(self) -> W {
        self.output
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{}", text).and_then(|_| self.output.flush()) {
            warn!("Failed to write to shell output: {}", e);
        }
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        if let Err(e) = write!(self.output, "{}", prompt).and_then(|_| self.output.flush()) {
            warn!("Failed to write prompt: {}", e);
        }
        self.read_line()
    }

    /// Next line without its terminator; `None` at EOF or on a read error
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Shell for LineShell<R, W> {
    fn next_event(&mut self) -> ShellEvent {
        match self.read_line() {
            Some(line) => ShellEvent::from_line(&line),
            None => ShellEvent::Closed,
        }
    }

    fn render_user_line(&mut self, text: &str) {
        self.emit(&format!("You: {}", text));
    }

    fn render_bot_line(&mut self, text: &str) {
        self.emit(&format!("Bot: {}", text));
    }

    fn prompt_yes_no(&mut self, title: &str, message: &str) -> bool {
        let prompt = format!("{}: {} [y/n] ", title, message);
        loop {
            let Some(reply) = self.ask(&prompt) else {
                return false;
            };
            match reply.trim().to_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.emit("Please enter y or n."),
            }
        }
    }

    fn prompt_text(&mut self, title: &str, message: &str) -> Option<String> {
        self.ask(&format!("{}: {} ", title, message))
    }

    fn clear(&mut self) {
        self.emit("-- conversation cleared --");
    }
}
