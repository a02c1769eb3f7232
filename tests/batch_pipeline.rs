//! Integration tests for the batch pipeline.
//!
//! Drives the full parse -> generate -> execute -> report -> export flow
//! with the deterministic mock generator; no network access required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use tabsight::batch::{self, BatchRunner, Outcome, RunState};
use tabsight::error::Result as TabsightResult;
use tabsight::exec::{CodeExecutor, ExecutorConfig};
use tabsight::llm::{CodeGenerator, GeneratedCode, MockCodeGenerator};
use tabsight::table::{Column, ColumnType, Table};

fn employee_table() -> Table {
    Table::new(
        vec![
            Column::new("employee", ColumnType::Text),
            Column::new("team", ColumnType::Text),
            Column::new("salary", ColumnType::Real),
        ],
        vec![
            vec!["Alice".into(), "Data".into(), 95.0.into()],
            vec!["Bob".into(), "Data".into(), 80.0.into()],
            vec!["Carol".into(), "Ops".into(), 70.0.into()],
        ],
    )
}

fn default_runner(generator: impl CodeGenerator + 'static) -> BatchRunner {
    BatchRunner::new(
        Arc::new(generator),
        CodeExecutor::new(ExecutorConfig::default()),
    )
}

#[tokio::test]
async fn full_pipeline_run_and_export_roundtrip() {
    let content = "\
[Employee & Work Insights]
Count the employees.
How many columns are there?

[Totals]
Sum all salaries.
";
    let queries = batch::parse_queries(content);
    assert_eq!(queries.len(), 3);

    let mut runner = default_runner(MockCodeGenerator::new());
    let report = runner
        .run(&employee_table(), &queries, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(runner.state(), RunState::Finished);
    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.total(), report.records().len());

    // Record order equals query order, sections included
    let order: Vec<&str> = report.records().iter().map(|r| r.query.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "Count the employees.",
            "How many columns are there?",
            "Sum all salaries."
        ]
    );
    assert_eq!(
        report.records()[0].section.as_deref(),
        Some("Employee & Work Insights")
    );
    assert_eq!(report.records()[2].section.as_deref(), Some("Totals"));

    // The count query really counted
    match &report.records()[0].outcome {
        Outcome::Success { result_summary, .. } => assert_eq!(result_summary, "3"),
        other => panic!("Expected success, got {other:?}"),
    }

    // Export twice: byte-equal, and round-trips to an equal report
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("report_a.json");
    let second = dir.path().join("report_b.json");
    batch::write_json(&report, &first).unwrap();
    batch::write_json(&report, &second).unwrap();
    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );

    let restored = batch::read_json(&first).unwrap();
    assert_eq!(restored, report);
    assert_eq!(restored.records(), report.records());
}

#[tokio::test]
async fn execution_failure_is_counted_and_batch_continues() {
    // Query 2 generates code whose execution raises at runtime
    let generator = MockCodeGenerator::new().with_response("broken", "let result = boom();");
    let queries = batch::parse_queries("Count one.\nRun the broken one.\nCount three.\n");

    let mut runner = default_runner(generator);
    let report = runner
        .run(&employee_table(), &queries, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    match &report.records()[1].outcome {
        Outcome::Failure { error_message, .. } => assert!(!error_message.is_empty()),
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn generator_failure_on_middle_query_leaves_neighbors_intact() {
    let generator = MockCodeGenerator::new().with_failure("unreachable");
    let queries =
        batch::parse_queries("Count first.\nThis one is unreachable.\nCount last.\n");

    let mut runner = default_runner(generator);
    let report = runner
        .run(&employee_table(), &queries, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    match &report.records()[1].outcome {
        Outcome::Failure {
            error_message,
            generated_code,
            latency_seconds,
        } => {
            assert!(error_message.contains("Mock generation failure"));
            assert!(generated_code.is_empty());
            assert_eq!(*latency_seconds, 0.0);
        }
        other => panic!("Expected failure, got {other:?}"),
    }
    assert!(report.records()[0].outcome.is_success());
    assert!(report.records()[2].outcome.is_success());
}

/// Generator that cancels the run's token during its Nth call.
struct CancellingGenerator {
    inner: MockCodeGenerator,
    cancel_on_call: usize,
    calls: AtomicUsize,
    token: CancellationToken,
}

#[async_trait]
impl CodeGenerator for CancellingGenerator {
    async fn generate(
        &self,
        instruction: &str,
        structure: &tabsight::table::TableStructure,
    ) -> TabsightResult<GeneratedCode> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.cancel_on_call {
            self.token.cancel();
        }
        self.inner.generate(instruction, structure).await
    }
}

#[tokio::test]
async fn cancellation_finalizes_over_completed_prefix() {
    let cancel = CancellationToken::new();
    let generator = CancellingGenerator {
        inner: MockCodeGenerator::new(),
        cancel_on_call: 2,
        calls: AtomicUsize::new(0),
        token: cancel.clone(),
    };
    let queries = batch::parse_queries(
        "Count 1.\nCount 2.\nCount 3.\nCount 4.\nCount 5.\n",
    );
    assert_eq!(queries.len(), 5);

    let mut runner = default_runner(generator);
    let report = runner.run(&employee_table(), &queries, &cancel).await.unwrap();

    // The in-flight query (#2) completes; the boundary check stops the rest
    assert_eq!(report.total(), 2);
    assert_eq!(report.succeeded() + report.failed(), 2);
    assert_eq!(runner.state(), RunState::Finished);

    let order: Vec<&str> = report.records().iter().map(|r| r.query.as_str()).collect();
    assert_eq!(order, vec!["Count 1.", "Count 2."]);
}

#[tokio::test]
async fn zero_query_file_finalizes_with_zero_counters() {
    let queries = batch::parse_queries("\n\n[Section With No Queries]\n\n");
    assert!(queries.is_empty());

    let mut runner = default_runner(MockCodeGenerator::new());
    let report = runner
        .run(&employee_table(), &queries, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total(), 0);
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failed(), 0);
    assert_eq!(runner.state(), RunState::Finished);
}

#[tokio::test]
async fn source_table_survives_hostile_scripts_unchanged() {
    let generator = MockCodeGenerator::new()
        .with_response("wipe", "table.clear(); let result = table.len();")
        .with_response(
            "overwrite",
            "for i in 0..table.len() { table[i][\"salary\"] = 0.0; } let result = \"done\";",
        );
    let queries = batch::parse_queries("Please wipe everything.\nNow overwrite salaries.\n");

    let table = employee_table();
    let before = table.clone();

    let mut runner = default_runner(generator);
    let report = runner
        .run(&table, &queries, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(table, before);
}

#[tokio::test]
async fn finished_runner_requires_a_fresh_run() {
    let queries = batch::parse_queries("Count once.\n");
    let mut runner = default_runner(MockCodeGenerator::new());
    let cancel = CancellationToken::new();

    runner
        .run(&employee_table(), &queries, &cancel)
        .await
        .unwrap();

    let err = runner
        .run(&employee_table(), &queries, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.category(), "Internal Error");
}
