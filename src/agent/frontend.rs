//! Where questions come from and where answers go.
//!
//! The session loop reads through [`QuerySource`] and writes through
//! [`Presenter`]; the console versions here are what the binary uses.

use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::io::Write as _;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::error::AppError;

use super::session::ExitReason;

pub trait QuerySource {
    /// Next raw line, or `None` once the source is exhausted.
    fn next_query(&mut self) -> impl Future<Output = Result<Option<String>, AppError>> + Send;
}

pub trait Presenter {
    /// A cold-start question is about to be answered.
    fn seed_question(&mut self, query: &str);
    fn answer(&mut self, answer: &str);
    fn farewell(&mut self, reason: ExitReason);
}

// ── stdin ─────────────────────────────────────────────────────────────────────

/// Interactive console input with a `You: ` prompt.
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySource for StdinSource {
    async fn next_query(&mut self) -> Result<Option<String>, AppError> {
        print!("\nYou: ");
        let _ = std::io::stdout().flush();

        self.lines
            .next_line()
            .await
            .map_err(|e| AppError::Input(format!("stdin read failed: {e}")))
    }
}

// ── scripted ──────────────────────────────────────────────────────────────────

/// Questions from a fixed list, e.g. a file with one question per line.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
    echo: bool,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { lines: lines.into_iter().map(Into::into).collect(), echo: false }
    }

    /// One question per line; echoes each as if typed.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Input(format!("cannot read script {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded question script");
        Ok(Self::new(text.lines()).with_echo(true))
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl QuerySource for ScriptedSource {
    async fn next_query(&mut self) -> Result<Option<String>, AppError> {
        let line = self.lines.pop_front();
        if self.echo {
            if let Some(l) = line.as_deref().filter(|l| !l.trim().is_empty()) {
                println!("\nYou: {l}");
            }
        }
        Ok(line)
    }
}

// ── console output ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn seed_question(&mut self, query: &str) {
        println!("\nYou: {query}");
    }

    fn answer(&mut self, answer: &str) {
        println!("{}", format_answer(answer));
    }

    fn farewell(&mut self, reason: ExitReason) {
        println!("{}", reason.farewell());
    }
}

/// Console rendering of one answer: a header, the trimmed text, a rule.
pub fn format_answer(answer: &str) -> String {
    format!("\nAgent:\n{}\n{}", answer.trim(), "=".repeat(20))
}
