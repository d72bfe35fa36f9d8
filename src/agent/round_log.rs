//! Per-round text logs.
//!
//! Every completed turn appends one record to each of four files in the run's
//! `logs/` directory. Streams are written independently: a failure on one is
//! reported back to the caller and does not stop the others.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// One of the four append-only round logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    /// The answer appended to memory.
    AgentMemory,
    ContextRetrieval,
    MemoryRetrieval,
    /// Keywords appended to the cache.
    KeywordsCached,
}

impl LogStream {
    pub const ALL: [LogStream; 4] = [
        LogStream::AgentMemory,
        LogStream::ContextRetrieval,
        LogStream::MemoryRetrieval,
        LogStream::KeywordsCached,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            LogStream::AgentMemory => "agent_mem.txt",
            LogStream::ContextRetrieval => "context_retrieval_log.txt",
            LogStream::MemoryRetrieval => "mem_retrieval_log.txt",
            LogStream::KeywordsCached => "keywords_cached.txt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogStream::AgentMemory => "Agent Memory (new):",
            LogStream::ContextRetrieval => "Context retrieval:",
            LogStream::MemoryRetrieval => "Memory retrieval:",
            LogStream::KeywordsCached => "Keywords cached:",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Everything one completed turn contributes to the logs.
#[derive(Debug, Clone, Copy)]
pub struct RoundRecord<'a> {
    pub round: usize,
    pub query: &'a str,
    pub answer: &'a str,
    pub context_retrieval: &'a str,
    pub memory_retrieval: &'a str,
    pub keywords: &'a str,
}

impl RoundRecord<'_> {
    pub fn body(&self, stream: LogStream) -> &str {
        match stream {
            LogStream::AgentMemory => self.answer,
            LogStream::ContextRetrieval => self.context_retrieval,
            LogStream::MemoryRetrieval => self.memory_retrieval,
            LogStream::KeywordsCached => self.keywords,
        }
    }

    /// The text appended to `stream` for this round.
    pub fn entry(&self, stream: LogStream) -> String {
        format!(
            "\n\n==== Round {} ====\nUser: {}\n{}\n{}\n",
            self.round,
            self.query,
            stream.label(),
            self.body(stream).trim()
        )
    }
}

/// A stream that could not be written for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFault {
    pub stream: LogStream,
    pub message: String,
}

pub trait RoundLogger {
    /// Append `record` to every stream; returns the streams that failed.
    fn record(&self, record: &RoundRecord<'_>) -> Vec<LogFault>;
}

/// Writes the four streams as files under one directory.
#[derive(Debug, Clone)]
pub struct FileRoundLogger {
    dir: PathBuf,
}

impl FileRoundLogger {
    /// Creates `dir` (and parents) if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Logger(format!("cannot create log directory {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, stream: LogStream) -> PathBuf {
        self.dir.join(stream.file_name())
    }

    fn append(&self, stream: LogStream, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(stream))?;
        file.write_all(text.as_bytes())
    }
}

impl RoundLogger for FileRoundLogger {
    fn record(&self, record: &RoundRecord<'_>) -> Vec<LogFault> {
        LogStream::ALL
            .into_iter()
            .filter_map(|stream| {
                self.append(stream, &record.entry(stream))
                    .err()
                    .map(|e| LogFault { stream, message: e.to_string() })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record<'a>(round: usize, answer: &'a str) -> RoundRecord<'a> {
        RoundRecord {
            round,
            query: "Who is Alice?",
            answer,
            context_retrieval: "Alice was beginning to get very tired.",
            memory_retrieval: "",
            keywords: "[\"Alice\"]\n",
        }
    }

    #[test]
    fn entry_format() {
        let r = record(0, "  Alice is a girl.\n");
        assert_eq!(
            r.entry(LogStream::AgentMemory),
            "\n\n==== Round 0 ====\nUser: Who is Alice?\nAgent Memory (new):\nAlice is a girl.\n"
        );
        assert_eq!(
            r.entry(LogStream::MemoryRetrieval),
            "\n\n==== Round 0 ====\nUser: Who is Alice?\nMemory retrieval:\n\n"
        );
    }

    #[test]
    fn writes_all_four_files_and_appends() {
        let dir = TempDir::new().unwrap();
        let logger = FileRoundLogger::create(dir.path().join("run/logs")).unwrap();

        assert!(logger.record(&record(0, "first")).is_empty());
        assert!(logger.record(&record(1, "second")).is_empty());

        for stream in LogStream::ALL {
            assert!(logger.path(stream).exists(), "{stream} missing");
        }
        let mem = fs::read_to_string(logger.path(LogStream::AgentMemory)).unwrap();
        assert!(mem.find("==== Round 0 ====").unwrap() < mem.find("==== Round 1 ====").unwrap());
        assert!(mem.contains("Agent Memory (new):\nfirst\n"));

        let kw = fs::read_to_string(logger.path(LogStream::KeywordsCached)).unwrap();
        assert!(kw.contains("Keywords cached:\n[\"Alice\"]\n"));
    }

    #[test]
    fn one_broken_stream_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        let logger = FileRoundLogger::create(dir.path()).unwrap();
        // A directory where a file should be makes that one append fail.
        fs::create_dir(logger.path(LogStream::ContextRetrieval)).unwrap();

        let faults = logger.record(&record(0, "answer"));
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].stream, LogStream::ContextRetrieval);
        assert!(logger.path(LogStream::AgentMemory).is_file());
        assert!(logger.path(LogStream::KeywordsCached).is_file());
    }
}
