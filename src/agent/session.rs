//! The conversational memory loop.
//!
//! A [`Session`] owns the novel, the append-only memory and keyword cache,
//! and the round counter. Each turn retrieves from memory (once there is any)
//! and from the novel, asks for a grounded answer, asks for the question's
//! keywords, then commits both results, logs the round and shows the answer.
//!
//! Turn results are computed against a shared borrow of the session and only
//! committed once every collaborator call has succeeded, so a failed turn
//! leaves memory, keyword cache and round counter untouched.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::error::AppError;
use crate::llm::Generator;
use crate::retrieval::Retriever;

use super::frontend::{Presenter, QuerySource};
use super::memory::AppendLog;
use super::prompt::{MemorySection, PromptTemplates};
use super::round_log::{RoundLogger, RoundRecord};

/// Asked, in order, before any user input is read.
pub const COLD_START_QUESTIONS: [&str; 3] = [
    "What core themes and genres best describe this novel?",
    "What is the central narrative hook or premise introduced early in the story?",
    "How would you describe the author's writing style and tone, based on the opening chapters?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Answering the cold-start questions; user input is not read.
    Seeding,
    Interactive,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed `exit` or `quit`.
    UserExit,
    /// Ctrl-C while waiting for input, or between turns.
    Interrupted,
    /// The query source ran dry (EOF on stdin, end of a script).
    InputClosed,
    /// A retrieval or generation call failed.
    Failed,
}

impl ExitReason {
    pub fn farewell(self) -> &'static str {
        match self {
            ExitReason::UserExit => "Exiting.",
            ExitReason::Interrupted => "\nExiting by user interruption.",
            ExitReason::InputClosed => "\nInput closed. Exiting.",
            ExitReason::Failed => "Session ended after an error.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub rounds_completed: usize,
    pub exit: ExitReason,
}

/// Everything one turn produced, before it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub round: usize,
    pub query: String,
    /// `None` when memory was still empty and was not searched.
    pub memory_retrieval: Option<String>,
    pub context_retrieval: String,
    /// Memory keywords, then context keywords, then the extracted keywords.
    pub keywords: String,
    pub answer: String,
}

impl Turn {
    pub fn record(&self) -> RoundRecord<'_> {
        RoundRecord {
            round: self.round,
            query: &self.query,
            answer: &self.answer,
            context_retrieval: &self.context_retrieval,
            memory_retrieval: self.memory_retrieval.as_deref().unwrap_or(""),
            keywords: &self.keywords,
        }
    }
}

/// `exit` / `quit`, any case, surrounding whitespace ignored.
pub fn is_exit_command(query: &str) -> bool {
    let q = query.trim();
    q.eq_ignore_ascii_case("exit") || q.eq_ignore_ascii_case("quit")
}

pub struct Session<R, G> {
    id: Uuid,
    settings: Settings,
    document: String,
    memory: AppendLog,
    keyword_cache: AppendLog,
    round_index: usize,
    cold_start: Vec<String>,
    state: LoopState,
    exit: Option<ExitReason>,
    prompts: PromptTemplates,
    retriever: R,
    generator: G,
}

impl<R, G> Session<R, G>
where
    R: Retriever,
    G: Generator,
{
    /// New session seeded with [`COLD_START_QUESTIONS`].
    pub fn new(settings: Settings, document: impl Into<String>, retriever: R, generator: G) -> Self {
        Self {
            id: Uuid::now_v7(),
            settings,
            document: document.into(),
            memory: AppendLog::new(),
            keyword_cache: AppendLog::new(),
            round_index: 0,
            cold_start: COLD_START_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            state: LoopState::Seeding,
            exit: None,
            prompts: PromptTemplates::default(),
            retriever,
            generator,
        }
    }

    /// Replace the seed questions; an empty list starts straight in
    /// [`LoopState::Interactive`].
    pub fn with_cold_start<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cold_start = questions.into_iter().map(Into::into).collect();
        self.state = self.seeding_or_interactive();
        self
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn memory(&self) -> &AppendLog {
        &self.memory
    }

    pub fn keyword_cache(&self) -> &AppendLog {
        &self.keyword_cache
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Drive the loop until the user exits, input ends, `shutdown` fires, or
    /// a turn fails. A terminated session returns its outcome again.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn run<Q, P, L>(
        &mut self,
        source: &mut Q,
        presenter: &mut P,
        logger: &L,
        shutdown: &CancellationToken,
    ) -> Result<SessionOutcome, AppError>
    where
        Q: QuerySource,
        P: Presenter,
        L: RoundLogger,
    {
        if self.state == LoopState::Terminated {
            return Ok(self.outcome());
        }
        info!(
            round = self.round_index,
            seeds = self.cold_start.len(),
            matching_method = %self.settings.matching_method(),
            "session started"
        );

        loop {
            if shutdown.is_cancelled() {
                return Ok(self.terminate(ExitReason::Interrupted, presenter));
            }

            let query = match self.state {
                LoopState::Terminated => return Ok(self.outcome()),
                LoopState::Seeding => {
                    let Some(seed) = self.cold_start.get(self.round_index).cloned() else {
                        self.state = LoopState::Interactive;
                        continue;
                    };
                    presenter.seed_question(&seed);
                    seed
                }
                LoopState::Interactive => {
                    let next = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => None,
                        line = source.next_query() => Some(line),
                    };
                    let line = match next {
                        None => return Ok(self.terminate(ExitReason::Interrupted, presenter)),
                        Some(Err(e)) => {
                            self.abort(&e, presenter);
                            return Err(e);
                        }
                        Some(Ok(None)) => {
                            return Ok(self.terminate(ExitReason::InputClosed, presenter));
                        }
                        Some(Ok(Some(line))) => line,
                    };
                    let query = line.trim();
                    if query.is_empty() {
                        continue;
                    }
                    if is_exit_command(query) {
                        return Ok(self.terminate(ExitReason::UserExit, presenter));
                    }
                    query.to_string()
                }
            };

            if let Err(e) = self.turn(&query, presenter, logger).await {
                self.abort(&e, presenter);
                return Err(e);
            }
        }
    }

    async fn turn<P, L>(&mut self, query: &str, presenter: &mut P, logger: &L) -> Result<(), AppError>
    where
        P: Presenter,
        L: RoundLogger,
    {
        let turn = self.execute_turn(query).await?;

        self.memory.append(&turn.answer);
        self.keyword_cache.append(&turn.keywords);

        for fault in logger.record(&turn.record()) {
            warn!(round = turn.round, stream = %fault.stream, error = %fault.message, "round log write failed");
        }
        presenter.answer(&turn.answer);

        self.round_index += 1;
        self.state = self.seeding_or_interactive();
        info!(
            round = turn.round,
            memory_len = self.memory.len(),
            keyword_cache_len = self.keyword_cache.len(),
            "round complete"
        );
        Ok(())
    }

    /// Run every collaborator call for `query` without touching session state.
    /// Both retrievals see the keyword cache as it was when the turn began.
    pub async fn execute_turn(&self, query: &str) -> Result<Turn, AppError> {
        let cached = self.keyword_cache.as_str();
        let mut keywords = String::new();

        let memory_retrieval = if self.memory.is_empty() {
            debug!(round = self.round_index, "memory empty, skipping memory retrieval");
            None
        } else {
            let hit = self.retriever.retrieve(self.memory.as_str(), query, cached).await?;
            keywords.push_str(&hit.keywords);
            Some(hit.excerpt)
        };

        let context = self.retriever.retrieve(&self.document, query, cached).await?;
        keywords.push_str(&context.keywords);
        debug!(
            round = self.round_index,
            context_len = context.excerpt.len(),
            memory_hit_len = memory_retrieval.as_deref().map(str::len),
            "retrieval done"
        );

        let section = match memory_retrieval.as_deref() {
            None => MemorySection::Empty,
            Some(m) => MemorySection::Retrieved(m),
        };
        let prompt = self.prompts.grounded(&context.excerpt, section, query);
        let answer = self.generator.generate(&prompt).await?;

        let extracted = self.generator.generate(&self.prompts.keywords(query)).await?;
        keywords.push_str(&extracted);

        Ok(Turn {
            round: self.round_index,
            query: query.to_string(),
            memory_retrieval,
            context_retrieval: context.excerpt,
            keywords,
            answer,
        })
    }

    fn seeding_or_interactive(&self) -> LoopState {
        if self.round_index < self.cold_start.len() {
            LoopState::Seeding
        } else {
            LoopState::Interactive
        }
    }

    fn terminate<P: Presenter>(&mut self, reason: ExitReason, presenter: &mut P) -> SessionOutcome {
        self.state = LoopState::Terminated;
        self.exit = Some(reason);
        info!(rounds = self.round_index, reason = ?reason, "session ended");
        presenter.farewell(reason);
        self.outcome()
    }

    fn abort<P: Presenter>(&mut self, e: &AppError, presenter: &mut P) {
        error!(round = self.round_index, error = %e, "turn failed, session aborted");
        self.state = LoopState::Terminated;
        self.exit = Some(ExitReason::Failed);
        presenter.farewell(ExitReason::Failed);
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            rounds_completed: self.round_index,
            exit: self.exit.unwrap_or(ExitReason::Failed),
        }
    }
}
