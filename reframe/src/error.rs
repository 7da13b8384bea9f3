//! Error types for the reframe batch pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Input table reading and decoding errors
//! - [`TransformError`] - Rule-based prompt rewriting errors
//! - [`ScoringError`] - Prompt scoring errors
//! - [`ConfigError`] - Configuration loading errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or decoding the input table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content as {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors from the row transformer.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Language tag outside the supported set.
    #[error("Unsupported language: '{0}' (expected 'zh' or 'en')")]
    UnsupportedLanguage(String),

    /// A single row could not be rewritten.
    #[error("Row {row} failed: {message}")]
    RowTransformFailure { row: usize, message: String },
}

// =============================================================================
// Scoring Errors
// =============================================================================

/// Errors while scoring generated prompts.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The scored table lacks a required column.
    #[error("Scoring failed: missing column '{0}'")]
    MissingColumn(String),

    /// The scored row lacks a required cell.
    #[error("Scoring failed on row {row}: missing value for '{column}'")]
    MissingValue { row: usize, column: String },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while assembling the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Batch size must be at least one row.
    #[error("Batch size must be greater than zero")]
    ZeroBatchSize,

    /// An environment variable held an unusable value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::run`] and
/// [`crate::transform::BatchProcessor::process`]. Only these failures end a
/// run. Row transform and scoring failures are contained and logged where
/// they occur, and configuration errors are raised before a run starts.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configured input table does not exist.
    #[error("Input file not found: {}", .0.display())]
    MissingInputSource(PathBuf),

    /// The input table has no `task` column.
    #[error("Input table has no '{column}' column (found: {found})")]
    MissingTaskColumn { column: String, found: String },

    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// The log file could not be opened.
    #[error("Cannot open log file {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The final table could not be persisted.
    #[error("Failed to write output {}: {message}", path.display())]
    OutputWriteFailure { path: PathBuf, message: String },
}

impl PipelineError {
    /// Build an [`PipelineError::OutputWriteFailure`] from any displayable cause.
    pub fn output(path: impl Into<PathBuf>, cause: impl std::fmt::Display) -> Self {
        PipelineError::OutputWriteFailure {
            path: path.into(),
            message: cause.to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for scoring operations.
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
