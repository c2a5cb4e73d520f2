//! Interactive input as an explicit capability.
//!
//! The encrypt and decrypt flows never touch stdin directly; they ask a
//! [`Prompter`] for answers, so the retry loop is driven by the caller's
//! input source rather than by process state.

use crate::error::Result;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

pub trait Prompter {
    /// Ask for a secret. `Ok(None)` means the input is exhausted.
    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Ask for a plain line of text. `Ok(None)` means the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Show a message to the person at the prompt
    fn notify(&mut self, message: &str);
}

fn trim_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Prompts on stderr and reads answers from stdin.
///
/// When stdin is a terminal, secrets are read without echo.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_stdin_line(&self, prompt: &str) -> Result<Option<String>> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(trim_line_ending(line)))
    }
}

impl Prompter for ConsolePrompter {
    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        if io::stdin().is_terminal() {
            match rpassword::prompt_password(prompt) {
                Ok(secret) => Ok(Some(secret)),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
                Err(e) => Err(e.into()),
            }
        } else {
            self.read_stdin_line(prompt)
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.read_stdin_line(prompt)
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Answers from a fixed queue; records every notice it is shown
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn read_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
