//! Generated-code execution.
//!
//! Provides the isolation boundary that runs generated scripts against a
//! copy of the loaded table, independently testable of the batch runner.

mod executor;

pub use executor::{CodeExecutor, ExecFailure, ExecOutcome, ExecutorConfig, RESULT_VAR, TABLE_BINDING};
