//! # Reframe - keyword-driven prompt rewriting for text-to-image tasks
//!
//! Reframe reads a CSV of short task descriptions, rewrites each task into a
//! staged Chinese and English scene prompt using keyword-triggered templates,
//! and writes the table back with two extra columns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Rewriter   │────▶│  CSV File   │
//! │ (UTF8/GBK)  │     │  (auto-enc) │     │ (rule table)│     │ (+prompts)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │   Scoring   │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reframe::{generate_prompts, score_pair};
//!
//! let pair = generate_prompts("一个人在打架");
//! let scores = score_pair(&pair, "一个人在打架");
//! println!("{} / {}", scores.total(), reframe::ScoreVector::max_total());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Language, prompt pair, score vector
//! - [`config`] - Layered run configuration
//! - [`logs`] - Run log handle
//! - [`parser`] - CSV reading/writing with auto-detection
//! - [`transform`] - Rule table, rewriter, batch pipeline
//! - [`scoring`] - Heuristic prompt scoring

// Core modules
pub mod error;
pub mod models;

// Configuration and logging
pub mod config;
pub mod logs;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Scoring
pub mod scoring;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, CsvError, PipelineError, ScoringError, TransformError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Language, PromptPair, ScoreDimension, ScoreVector, DIMENSION_MAX};

// =============================================================================
// Re-exports - Config & logs
// =============================================================================

pub use config::{Config, ConfigOverrides};
pub use logs::{LogEntry, LogLevel, RunLog};

// =============================================================================
// Re-exports - CSV
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_table, write_table, write_table_file, ParseResult, Table,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    explain, generate_prompts, rules_description, rules_for, run, transform, transform_lang,
    BatchProcessor, ProcessOptions, ProcessOutcome, Rewrite, RowFailure, Rule, RuleCategory,
    RunOptions, RunSummary,
};

// =============================================================================
// Re-exports - Scoring
// =============================================================================

pub use scoring::{evaluate_table, score, score_pair, EvaluationReport, RowScore};
