//! Tabsight - AI-assisted spreadsheet analysis toolbox.

use std::io::Write;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tabsight::batch::{self, BatchReport, BatchRunner, Outcome};
use tabsight::cli::{Cli, Command};
use tabsight::config::Config;
use tabsight::error::Result;
use tabsight::exec::CodeExecutor;
use tabsight::llm::{create_generator, CodeGenerator};
use tabsight::table::{load_table, write_parquet, Table};
use tabsight::{exec, logging};

#[tokio::main]
async fn main() {
    // A .env file may carry GROQ_API_KEY, as in local dev setups
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);

    match &cli.command {
        Command::Convert { data_file, out } => run_convert(&config, data_file, out.as_deref()),
        Command::Analyze {
            data_file,
            instruction,
        } => run_analyze(&config, data_file, instruction.as_deref()).await,
        Command::Batch {
            data_file,
            queries_file,
            export,
        } => run_batch(&config, data_file, queries_file, export.as_deref()).await,
    }
}

/// Loads a spreadsheet and reports its shape.
fn load_and_report(data_file: &Path) -> Result<Table> {
    println!("Loading data from {}...", data_file.display());
    let table = load_table(data_file)?;
    println!(
        "Loaded {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );
    println!("Columns: {}", table.column_names().join(", "));
    Ok(table)
}

fn run_convert(config: &Config, data_file: &Path, out: Option<&Path>) -> Result<()> {
    let table = load_and_report(data_file)?;

    let out_path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.paths.processed_path_for(data_file));
    write_parquet(&table, &out_path)?;
    println!("Wrote {}", out_path.display());

    Ok(())
}

async fn run_analyze(config: &Config, data_file: &Path, instruction: Option<&str>) -> Result<()> {
    let table = load_and_report(data_file)?;
    let generator = create_generator(&config.llm)?;
    let executor = CodeExecutor::new(config.executor.to_executor_config());

    match instruction {
        Some(instruction) => analyze_once(&*generator, &executor, &table, instruction).await,
        None => analyze_loop(&*generator, &executor, &table).await,
    }
}

/// Interactive mode: reads instructions from stdin until quit/exit.
async fn analyze_loop(
    generator: &dyn CodeGenerator,
    executor: &CodeExecutor,
    table: &Table,
) -> Result<()> {
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            break; // EOF
        }
        let instruction = line.trim();

        if instruction.is_empty() {
            continue;
        }
        if matches!(instruction.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        analyze_once(generator, executor, table, instruction).await?;
    }

    Ok(())
}

/// Runs one instruction through the generate-and-execute pipeline.
///
/// Failures are reported on stdout, not propagated: a bad instruction or a
/// broken script is an answer, not a crash.
async fn analyze_once(
    generator: &dyn CodeGenerator,
    executor: &CodeExecutor,
    table: &Table,
    instruction: &str,
) -> Result<()> {
    println!("Generating analysis...");

    let generated = match generator.generate(instruction, &table.structure()).await {
        Ok(generated) => generated,
        Err(e) => {
            println!("Analysis failed: {e}");
            return Ok(());
        }
    };

    println!(
        "Model: {}  Latency: {:.3}s  Tokens: {}",
        generated.model,
        generated.latency.as_secs_f64(),
        generated.total_tokens()
    );

    match executor.execute(&generated.code, table) {
        exec::ExecOutcome::Completed { summary } => {
            println!("Result: {summary}");
        }
        exec::ExecOutcome::Failed { kind, message } => {
            println!("Execution failed ({kind}): {message}");
        }
    }

    println!("Generated code:\n{}", generated.code);
    Ok(())
}

async fn run_batch(
    config: &Config,
    data_file: &Path,
    queries_file: &Path,
    export: Option<&Path>,
) -> Result<()> {
    let table = load_and_report(data_file)?;

    println!("Loading queries from {}...", queries_file.display());
    let queries = batch::load_queries(queries_file)?;
    println!("Loaded {} queries", queries.len());

    let generator = create_generator(&config.llm)?;
    let executor = CodeExecutor::new(config.executor.to_executor_config());
    let mut runner = BatchRunner::new(generator, executor);

    // Ctrl-C stops the batch after the in-flight query completes
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received; stopping after the current query");
            signal_cancel.cancel();
        }
    });

    let report = runner.run(&table, &queries, &cancel).await?;
    print_report(&report);

    if let Some(path) = export {
        batch::write_json(&report, path)?;
        println!("Exported report to {}", path.display());
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    println!();
    println!("Batch Execution Summary");
    println!("=======================");
    println!("Total queries: {}", report.total());
    println!("Succeeded: {}", report.succeeded());
    println!("Failed: {}", report.failed());
    println!("Success rate: {:.1}%", report.success_rate());
    println!("Total time: {:.2}s", report.duration_seconds());
    if report.total() > 0 {
        println!(
            "Average time per query: {:.2}s",
            report.duration_seconds() / report.total() as f64
        );
    }

    println!();
    println!("Detailed Results");
    println!("================");
    for (idx, record) in report.records().iter().enumerate() {
        let section = record.section.as_deref().unwrap_or("-");
        println!();
        println!("Query {} [{}]: {}", idx + 1, section, record.query);
        match &record.outcome {
            Outcome::Success {
                result_summary,
                latency_seconds,
                prompt_tokens,
                completion_tokens,
                ..
            } => {
                println!("  Status: success");
                println!(
                    "  Latency: {:.3}s  Tokens: {}",
                    latency_seconds,
                    prompt_tokens + completion_tokens
                );
                println!("  Result: {result_summary}");
            }
            Outcome::Failure { error_message, .. } => {
                println!("  Status: failure");
                println!("  Error: {error_message}");
            }
        }
    }
}
