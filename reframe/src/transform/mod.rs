//! Transformation module.
//!
//! This module turns task rows into staged scene prompts:
//! - Rules: keyword triggers and templates per language
//! - Rewriter: single task to prompt
//! - Pipeline: whole-table batch processing

pub mod pipeline;
pub mod rewriter;
pub mod rules;

pub use pipeline::*;
pub use rewriter::*;
pub use rules::{fallback_for, rules_description, rules_for, select_rule, Rule, RuleCategory, TASK_SLOT};
