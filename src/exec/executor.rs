//! Script execution against an in-memory table.
//!
//! Runs generated Rhai code with the table bound under a configurable name
//! and reads the designated `result` variable from the post-execution
//! scope. Every failure mode is contained as an [`ExecOutcome`]: nothing a
//! script does can propagate an error (or a hang) out of this module.
//!
//! The engine gives scripts no filesystem, network or process access; on
//! top of that the executor enforces an operations cap and a wall-clock
//! deadline through the engine's progress hook. Stricter resource policies
//! slot in here without changing callers.

use std::fmt;
use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use tracing::debug;

use crate::table::{CellValue, Table};

/// Variable the generated code must assign its answer to.
pub const RESULT_VAR: &str = "result";

/// Default name the table is bound under inside scripts.
pub const TABLE_BINDING: &str = "table";

/// Default wall-clock budget for one script.
const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(5);

/// Default cap on engine operations for one script.
const DEFAULT_MAX_OPERATIONS: u64 = 5_000_000;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Name the table is bound under inside the script.
    pub binding_name: String,
    /// Wall-clock budget for one execution.
    pub time_budget: Duration,
    /// Cap on engine operations for one execution (0 = unlimited).
    pub max_operations: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            binding_name: TABLE_BINDING.to_string(),
            time_budget: DEFAULT_TIME_BUDGET,
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

/// How a script execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecFailure {
    /// The code failed to parse/compile.
    Compile,
    /// The code raised a runtime error.
    Runtime,
    /// The code exceeded its time or operations budget.
    Timeout,
    /// The code completed without assigning `result`.
    ResultMissing,
}

impl fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile error"),
            Self::Runtime => write!(f, "runtime error"),
            Self::Timeout => write!(f, "budget exceeded"),
            Self::ResultMissing => write!(f, "result missing"),
        }
    }
}

/// Outcome of executing one script.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Script completed and assigned `result`.
    Completed {
        /// Display form of the assigned result value.
        summary: String,
    },
    /// Script failed; the batch records this and moves on.
    Failed {
        kind: ExecFailure,
        message: String,
    },
}

impl ExecOutcome {
    fn failed(kind: ExecFailure, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Returns true if the script completed with a result.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Executes generated scripts against a table.
#[derive(Debug, Clone, Default)]
pub struct CodeExecutor {
    config: ExecutorConfig,
}

impl CodeExecutor {
    /// Creates an executor with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Returns the name scripts must use to reference the table.
    pub fn binding_name(&self) -> &str {
        &self.config.binding_name
    }

    /// Runs one script to completion, error or budget exhaustion.
    ///
    /// The script sees a deep copy of `table`; the original is untouched no
    /// matter what the script does.
    pub fn execute(&self, code: &str, table: &Table) -> ExecOutcome {
        let engine = self.build_engine();

        let ast = match engine.compile(code) {
            Ok(ast) => ast,
            Err(e) => return ExecOutcome::failed(ExecFailure::Compile, e.to_string()),
        };

        let mut scope = Scope::new();
        scope.push_dynamic(self.config.binding_name.clone(), table_to_dynamic(table));

        let started = Instant::now();
        let eval_result = engine.eval_ast_with_scope::<Dynamic>(&mut scope, &ast);
        debug!("Script executed in {:?}", started.elapsed());

        match eval_result {
            Ok(_) => match scope.get(RESULT_VAR).cloned() {
                Some(value) if !value.is_unit() => ExecOutcome::Completed {
                    summary: format_result(&value),
                },
                _ => ExecOutcome::failed(
                    ExecFailure::ResultMissing,
                    format!("script did not assign a value to `{RESULT_VAR}`"),
                ),
            },
            Err(e) => self.map_eval_error(*e),
        }
    }

    /// Builds a fresh engine with the configured resource limits.
    fn build_engine(&self) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(self.config.max_operations);

        let deadline = Instant::now() + self.config.time_budget;
        engine.on_progress(move |_| {
            if Instant::now() >= deadline {
                Some(Dynamic::UNIT)
            } else {
                None
            }
        });

        engine
    }

    fn map_eval_error(&self, error: EvalAltResult) -> ExecOutcome {
        match error {
            EvalAltResult::ErrorTerminated(_, _) => ExecOutcome::failed(
                ExecFailure::Timeout,
                format!("script exceeded its {:?} time budget", self.config.time_budget),
            ),
            EvalAltResult::ErrorTooManyOperations(_) => ExecOutcome::failed(
                ExecFailure::Timeout,
                format!(
                    "script exceeded the {} operations cap",
                    self.config.max_operations
                ),
            ),
            other => ExecOutcome::failed(ExecFailure::Runtime, other.to_string()),
        }
    }
}

/// Converts the table into the script-side representation: an array of
/// maps, one per row, keyed by column name. Building fresh Dynamics is what
/// guarantees the original table cannot be aliased from inside the script.
fn table_to_dynamic(table: &Table) -> Dynamic {
    let rows: rhai::Array = table
        .rows()
        .iter()
        .map(|row| {
            let mut map = rhai::Map::new();
            for (column, cell) in table.columns().iter().zip(row.iter()) {
                map.insert(column.name.as_str().into(), cell_to_dynamic(cell));
            }
            Dynamic::from_map(map)
        })
        .collect();
    Dynamic::from_array(rows)
}

fn cell_to_dynamic(cell: &CellValue) -> Dynamic {
    match cell {
        CellValue::Null => Dynamic::UNIT,
        CellValue::Int(i) => (*i).into(),
        CellValue::Real(f) => (*f).into(),
        CellValue::Text(s) => s.clone().into(),
        CellValue::Bool(b) => (*b).into(),
        CellValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string().into(),
    }
}

/// Formats the result value for the report.
fn format_result(value: &Dynamic) -> String {
    if value.is_string() {
        value.clone().into_string().unwrap_or_default()
    } else {
        value.to_string()
    }
}
