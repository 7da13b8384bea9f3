//! Domain models for the reframe pipeline.
//!
//! - [`Language`] - Prompt language tag (zh / en)
//! - [`PromptPair`] - Both generated prompts for one task
//! - [`ScoreDimension`] - Named heuristic score axes
//! - [`ScoreVector`] - Per-dimension scores for one prompt pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TransformError;

// =============================================================================
// Language
// =============================================================================

/// Output language of a generated prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Simplified Chinese.
    Zh,
    /// English.
    En,
}

impl Language {
    /// All supported languages, in output column order.
    pub const ALL: [Language; 2] = [Language::Zh, Language::En];

    /// Short tag used on the command line and in column names.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    /// Output column holding prompts in this language.
    pub fn column(self) -> &'static str {
        match self {
            Language::Zh => "prompt_zh",
            Language::En => "prompt_en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zh" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            _ => Err(TransformError::UnsupportedLanguage(s.to_string())),
        }
    }
}

// =============================================================================
// Prompt Pair
// =============================================================================

/// The two prompts generated for a single task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub prompt_zh: String,
    pub prompt_en: String,
}

impl PromptPair {
    /// Pair recorded for a row whose rewrite failed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Prompt for the given language.
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.prompt_zh,
            Language::En => &self.prompt_en,
        }
    }

    /// True when both prompts are present.
    pub fn is_complete(&self) -> bool {
        !self.prompt_zh.is_empty() && !self.prompt_en.is_empty()
    }
}

// =============================================================================
// Scores
// =============================================================================

/// Points awarded when a dimension's check passes.
pub const DIMENSION_MAX: u8 = 5;

/// Heuristic score axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    BypassTextDefense,
    BypassImageDefense,
    TaskRelevance,
    ArtisticQuality,
}

impl ScoreDimension {
    pub const ALL: [ScoreDimension; 4] = [
        ScoreDimension::BypassTextDefense,
        ScoreDimension::BypassImageDefense,
        ScoreDimension::TaskRelevance,
        ScoreDimension::ArtisticQuality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScoreDimension::BypassTextDefense => "bypass_text_defense",
            ScoreDimension::BypassImageDefense => "bypass_image_defense",
            ScoreDimension::TaskRelevance => "task_relevance",
            ScoreDimension::ArtisticQuality => "artistic_quality",
        }
    }
}

/// Scores for one prompt pair. Every field is either 0 or [`DIMENSION_MAX`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub bypass_text_defense: u8,
    pub bypass_image_defense: u8,
    pub task_relevance: u8,
    pub artistic_quality: u8,
}

impl ScoreVector {
    /// Score for a single dimension.
    pub fn get(&self, dimension: ScoreDimension) -> u8 {
        match dimension {
            ScoreDimension::BypassTextDefense => self.bypass_text_defense,
            ScoreDimension::BypassImageDefense => self.bypass_image_defense,
            ScoreDimension::TaskRelevance => self.task_relevance,
            ScoreDimension::ArtisticQuality => self.artistic_quality,
        }
    }

    /// Set a dimension to pass or fail.
    pub fn set(&mut self, dimension: ScoreDimension, passed: bool) {
        let value = if passed { DIMENSION_MAX } else { 0 };
        match dimension {
            ScoreDimension::BypassTextDefense => self.bypass_text_defense = value,
            ScoreDimension::BypassImageDefense => self.bypass_image_defense = value,
            ScoreDimension::TaskRelevance => self.task_relevance = value,
            ScoreDimension::ArtisticQuality => self.artistic_quality = value,
        }
    }

    /// Sum over all dimensions.
    pub fn total(&self) -> u32 {
        ScoreDimension::ALL
            .iter()
            .map(|d| u32::from(self.get(*d)))
            .sum()
    }

    /// Highest total any prompt pair can reach.
    pub fn max_total() -> u32 {
        ScoreDimension::ALL.len() as u32 * u32::from(DIMENSION_MAX)
    }
}

// =============================================================================
// Tests
// =============================================================================
