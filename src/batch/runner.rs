//! The batch run itself.
//!
//! Drives the code generator and executor over an ordered query list,
//! strictly sequentially, and accumulates one outcome per query. A single
//! query's failure never aborts the batch; the report's record order always
//! equals the input query order.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch::queries::Query;
use crate::batch::report::{BatchReport, Outcome, ReportBuilder};
use crate::error::{Result, TabsightError};
use crate::exec::{CodeExecutor, ExecOutcome};
use crate::llm::CodeGenerator;
use crate::table::{Table, TableStructure};

/// Lifecycle state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, not started.
    Idle,
    /// Executing queries.
    Running,
    /// Finished (completed or cancelled); accepts no further queries.
    Finished,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Runs a query batch against one table.
///
/// Single use: once a run finishes (normally or via cancellation) the
/// runner stays `Finished` and a fresh runner must be created for the next
/// batch.
pub struct BatchRunner {
    generator: Arc<dyn CodeGenerator>,
    executor: CodeExecutor,
    state: RunState,
}

impl BatchRunner {
    /// Creates an idle runner.
    pub fn new(generator: Arc<dyn CodeGenerator>, executor: CodeExecutor) -> Self {
        Self {
            generator,
            executor,
            state: RunState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs all queries in order and returns the finalized report.
    ///
    /// Cancellation is cooperative: the token is checked once per query
    /// boundary, and a cancelled run finalizes over the records accumulated
    /// so far. A zero-query batch finalizes immediately with all counters
    /// at zero.
    pub async fn run(
        &mut self,
        table: &Table,
        queries: &[Query],
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        if self.state != RunState::Idle {
            return Err(TabsightError::internal(
                "batch runner already finished; start a fresh run",
            ));
        }
        self.state = RunState::Running;

        let started = Instant::now();
        let structure = table.structure();
        let mut builder = ReportBuilder::new();

        for query in queries {
            if cancel.is_cancelled() {
                info!(
                    "Cancellation requested; finalizing after {} of {} queries",
                    builder.len(),
                    queries.len()
                );
                break;
            }

            info!("Query {}/{}: {}", query.ordinal, queries.len(), query.text);
            let outcome = self.run_query(query, table, &structure).await;
            match &outcome {
                Outcome::Success { result_summary, .. } => {
                    debug!("Query {} succeeded: {}", query.ordinal, result_summary)
                }
                Outcome::Failure { error_message, .. } => {
                    warn!("Query {} failed: {}", query.ordinal, error_message)
                }
            }
            builder.push(query, outcome);
        }

        self.state = RunState::Finished;
        Ok(builder.finalize(started.elapsed()))
    }

    /// Generates and executes one query, containing every failure as an
    /// outcome value.
    async fn run_query(&self, query: &Query, table: &Table, structure: &TableStructure) -> Outcome {
        let generated = match self.generator.generate(&query.text, structure).await {
            Ok(generated) => generated,
            Err(e) => {
                return Outcome::Failure {
                    error_message: e.to_string(),
                    generated_code: String::new(),
                    latency_seconds: 0.0,
                }
            }
        };

        let latency_seconds = generated.latency.as_secs_f64();
        match self.executor.execute(&generated.code, table) {
            ExecOutcome::Completed { summary } => Outcome::Success {
                result_summary: summary,
                generated_code: generated.code,
                latency_seconds,
                prompt_tokens: generated.prompt_tokens,
                completion_tokens: generated.completion_tokens,
            },
            ExecOutcome::Failed { kind, message } => Outcome::Failure {
                error_message: format!("{kind}: {message}"),
                generated_code: generated.code,
                latency_seconds,
            },
        }
    }
}
