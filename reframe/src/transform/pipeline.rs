//! Batch processing: read the task table, rewrite every row, write the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use reframe::{run, Config, RunLog, RunOptions};
//!
//! let config = Config::from_env()?;
//! let log = RunLog::open(&config.log_file, true)?;
//! let summary = run(&config, &log, &RunOptions::default())?;
//! println!("Rewrote {} tasks", summary.rows);
//! ```

use serde::Serialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::rewriter::generate_prompts;
use crate::config::{Config, DEFAULT_BATCH_SIZE, DEFAULT_TASK_COLUMN};
use crate::error::{PipelineError, PipelineResult, TransformError, TransformResult};
use crate::logs::RunLog;
use crate::models::{Language, PromptPair};
use crate::parser::{parse_csv_file_auto, write_table_file, Table};
use crate::scoring::{evaluate_table, EvaluationReport};

/// Options for [`BatchProcessor`]
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Rows per progress batch; never changes results
    pub batch_size: usize,
    /// Column holding the task text
    pub task_column: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            task_column: DEFAULT_TASK_COLUMN.to_string(),
        }
    }
}

impl From<&Config> for ProcessOptions {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            task_column: config.task_column.clone(),
        }
    }
}

/// A row whose prompts could not be generated.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based row number
    pub row: usize,
    /// Task text, empty when the cell was missing
    pub task: String,
    pub message: String,
}

/// Result of processing a table
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Input table with `prompt_zh` / `prompt_en` set
    pub table: Table,
    /// Generated prompts, one per row, in row order
    pub prompts: Vec<PromptPair>,
    /// Rows that ended up with empty prompts
    pub failures: Vec<RowFailure>,
}

/// Rewrites every row of a task table.
///
/// Holds a borrowed [`RunLog`]; nothing else is shared between rows.
pub struct BatchProcessor<'a> {
    log: &'a RunLog,
    options: ProcessOptions,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(log: &'a RunLog, options: ProcessOptions) -> Self {
        let batch_size = options.batch_size.max(1);
        Self {
            log,
            options: ProcessOptions {
                batch_size,
                ..options
            },
        }
    }

    /// Generate prompts for every row and append them as columns.
    ///
    /// Row failures are logged and leave that row's prompts empty; the batch
    /// always continues. Fails only when the task column is absent.
    pub fn process(&self, mut table: Table) -> PipelineResult<ProcessOutcome> {
        let task_column = &self.options.task_column;
        let task_index = match table.column_index(task_column) {
            Some(i) => i,
            None => {
                let err = PipelineError::MissingTaskColumn {
                    column: task_column.clone(),
                    found: table.headers.join(", "),
                };
                self.log.error(format!("Error processing CSV file: {}", err));
                return Err(err);
            }
        };

        let total = table.len();
        let batch_size = self.options.batch_size;
        let batch_count = total.div_ceil(batch_size);
        self.log.info(format!("Starting to process {} tasks", total));

        let mut prompts = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (batch, start) in (0..total).step_by(batch_size).enumerate() {
            let end = (start + batch_size).min(total);

            for row in start..end {
                match self.process_row(&table, row, task_index) {
                    Ok(pair) => prompts.push(pair),
                    Err(e) => {
                        let task = table.cell(row, task_index).unwrap_or_default().to_string();
                        self.log.error(format!(
                            "Error generating prompts for row {} (task: {:?}): {}",
                            row + 1,
                            task,
                            e
                        ));
                        failures.push(RowFailure {
                            row: row + 1,
                            task,
                            message: e.to_string(),
                        });
                        prompts.push(PromptPair::empty());
                    }
                }
                self.log.info(format!("Processed task {}/{}", row + 1, total));
            }

            self.log.info(format!(
                "Finished batch {}/{} (rows {}-{})",
                batch + 1,
                batch_count,
                start + 1,
                end
            ));
        }

        for language in Language::ALL {
            let column = prompts.iter().map(|p| p.get(language).to_string()).collect();
            table.set_column(language.column(), column);
        }

        Ok(ProcessOutcome {
            table,
            prompts,
            failures,
        })
    }

    fn process_row(&self, table: &Table, row: usize, task_index: usize) -> TransformResult<PromptPair> {
        let task = table
            .cell(row, task_index)
            .ok_or_else(|| TransformError::RowTransformFailure {
                row: row + 1,
                message: format!("row has no '{}' cell", self.options.task_column),
            })?;
        Ok(generate_prompts(task))
    }
}

/// Options for [`run`] beyond the [`Config`]
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Score the written table afterwards
    pub evaluate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { evaluate: true }
    }
}

/// Summary of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Rows read and written
    pub rows: usize,
    pub failures: Vec<RowFailure>,
    pub encoding: String,
    pub delimiter: char,
    pub evaluation: Option<EvaluationReport>,
}

/// Read the configured input, rewrite every row, write the output table.
///
/// The output is written once, after all rows are processed.
pub fn run(config: &Config, log: &RunLog, options: &RunOptions) -> PipelineResult<RunSummary> {
    let result = run_inner(config, log, options);
    if let Err(ref e) = result {
        log.error(format!("Run failed: {}", e));
    }
    let _ = log.flush();
    result
}

fn run_inner(config: &Config, log: &RunLog, options: &RunOptions) -> PipelineResult<RunSummary> {
    let run_id = Uuid::new_v4();
    log.info(format!("Run {} started", run_id));

    if !config.input.exists() {
        return Err(PipelineError::MissingInputSource(config.input.clone()));
    }
    ensure_parent_dir(&config.output)?;

    let parsed = parse_csv_file_auto(&config.input)?;
    log.info(format!(
        "Read {} ({}, delimiter '{}', {} columns)",
        config.input.display(),
        parsed.encoding,
        format_delimiter(parsed.delimiter),
        parsed.table.headers.len()
    ));

    let processor = BatchProcessor::new(log, ProcessOptions::from(config));
    let outcome = processor.process(parsed.table)?;

    write_table_file(&config.output, &outcome.table)
        .map_err(|e| PipelineError::output(&config.output, e))?;
    log.success(format!(
        "Successfully processed all tasks. Results saved to {}",
        config.output.display()
    ));
    if !outcome.failures.is_empty() {
        log.warning(format!("{} rows have empty prompts", outcome.failures.len()));
    }

    let evaluation = options.evaluate.then(|| {
        let report = evaluate_table(&outcome.table, &config.task_column, log);
        log.info(format!(
            "Total evaluation score: {} / {} over {} rows",
            report.total_score, report.max_score, report.rows_scored
        ));
        report
    });

    Ok(RunSummary {
        run_id,
        rows: outcome.table.len(),
        failures: outcome.failures,
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        evaluation,
    })
}

fn ensure_parent_dir(path: &Path) -> PipelineResult<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| PipelineError::output(path, e)),
        None => Ok(()),
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
