//! Conversational Q&A over one novel with a growing memory of past answers.
//!
//! [`session::Session`] is the loop core. Input, output and round logging are
//! adapters ([`frontend`], [`round_log`]) so the same loop serves the console
//! binary and scripted test runs.

pub mod frontend;
pub mod memory;
pub mod prompt;
pub mod round_log;
pub mod session;

pub use frontend::{ConsolePresenter, Presenter, QuerySource, ScriptedSource, StdinSource};
pub use memory::AppendLog;
pub use prompt::PromptTemplates;
pub use round_log::{FileRoundLogger, LogFault, LogStream, RoundLogger, RoundRecord};
pub use session::{COLD_START_QUESTIONS, ExitReason, LoopState, Session, SessionOutcome, Turn};
