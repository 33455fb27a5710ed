use crate::error::CasicsError;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Source of interactive answers.
pub trait Prompter {
    fn ask(&self, prompt: &str) -> Result<String, CasicsError>;

    /// Ask for a value that must not be echoed back or logged.
    fn ask_secret(&self, prompt: &str) -> Result<String, CasicsError>;
}

/// Prompts on stdout and reads one line from stdin per question.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, prompt: &str) -> Result<String, CasicsError> {
        let mut out = io::stdout().lock();
        out.write_all(prompt.as_bytes())?;
        out.flush()?;
        drop(out);

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Reads from the controlling terminal with echo turned off.
    fn ask_secret(&self, prompt: &str) -> Result<String, CasicsError> {
        Ok(rpassword::prompt_password(prompt)?)
    }
}

/// Replays canned answers in order and records the prompts it was shown.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
    hidden: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
            hidden: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Prompts that were asked through `ask_secret`.
    pub fn hidden(&self) -> Vec<String> {
        self.hidden.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, prompt: &str) -> Result<String, CasicsError> {
        self.asked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        Ok(self
            .answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_default())
    }

    fn ask_secret(&self, prompt: &str) -> Result<String, CasicsError> {
        self.hidden
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.ask(prompt)
    }
}
