//! Run configuration.
//!
//! Values are layered: built-in defaults, then `REFRAME_*` environment
//! variables (a `.env` file is loaded by the binary), then command-line
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

/// Default input table
pub const DEFAULT_INPUT: &str = "txt2img_risky_tasks.csv";

/// Default output table
pub const DEFAULT_OUTPUT: &str = "output/txt2img_risky_prompts.csv";

/// Default log file
pub const DEFAULT_LOG_FILE: &str = "output/processing.log";

/// Rows per progress batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Column holding the task text
pub const DEFAULT_TASK_COLUMN: &str = "task";

pub const ENV_INPUT: &str = "REFRAME_INPUT";
pub const ENV_OUTPUT: &str = "REFRAME_OUTPUT";
pub const ENV_BATCH_SIZE: &str = "REFRAME_BATCH_SIZE";
pub const ENV_LOG_FILE: &str = "REFRAME_LOG_FILE";
pub const ENV_TASK_COLUMN: &str = "REFRAME_TASK_COLUMN";

/// Effective configuration of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Input CSV path
    pub input: PathBuf,
    /// Output CSV path
    pub output: PathBuf,
    /// Rows per progress batch; only affects log cadence
    pub batch_size: usize,
    /// Log file path
    pub log_file: PathBuf,
    /// Name of the task column
    pub task_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            batch_size: DEFAULT_BATCH_SIZE,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            task_column: DEFAULT_TASK_COLUMN.to_string(),
        }
    }
}

/// Command-line overrides; `None` keeps the lower layer's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub log_file: Option<PathBuf>,
    pub task_column: Option<String>,
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = value(ENV_INPUT) {
            config.input = PathBuf::from(v);
        }
        if let Some(v) = value(ENV_OUTPUT) {
            config.output = PathBuf::from(v);
        }
        if let Some(v) = value(ENV_LOG_FILE) {
            config.log_file = PathBuf::from(v);
        }
        if let Some(v) = value(ENV_TASK_COLUMN) {
            config.task_column = v.trim().to_string();
        }
        if let Some(v) = value(ENV_BATCH_SIZE) {
            config.batch_size = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_BATCH_SIZE.to_string(),
                message: format!("'{}': {}", v, e),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> ConfigResult<Self> {
        if let Some(input) = overrides.input {
            self.input = input;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        if let Some(task_column) = overrides.task_column {
            self.task_column = task_column;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.task_column.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_TASK_COLUMN.to_string(),
                message: "column name is empty".to_string(),
            });
        }
        Ok(())
    }
}
