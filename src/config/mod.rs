mod cli;
mod file;

pub use cli::{Cli, Command};

use std::fmt;

use crate::activity::{GuardSettings, DEFAULT_WARNING_MESSAGE};
use crate::event::ApiLevel;
use crate::overlay::{ThrottleConfig, DEFAULT_BLOCK_DURATION_MS, DEFAULT_WARNING_THROTTLE_MS};

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub block_duration_ms: u64,
    pub warning_throttle_ms: u64,
    pub api_level: u32,
    pub warning_message: String,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        Self::merge(cli, file_config)
    }

    fn merge(cli: &Cli, file_config: file::FileConfig) -> Self {
        Self {
            block_duration_ms: cli
                .block_duration_ms
                .or(file_config.block_duration_ms)
                .unwrap_or(DEFAULT_BLOCK_DURATION_MS),
            warning_throttle_ms: cli
                .warning_throttle_ms
                .or(file_config.warning_throttle_ms)
                .unwrap_or(DEFAULT_WARNING_THROTTLE_MS),
            api_level: cli
                .api_level
                .or(file_config.api_level)
                .unwrap_or(ApiLevel::default().0),
            warning_message: cli
                .warning_message
                .clone()
                .or(file_config.warning_message)
                .unwrap_or_else(|| DEFAULT_WARNING_MESSAGE.into()),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.api_level == 0 {
            return Err("API level must be at least 1");
        }
        if self.warning_message.trim().is_empty() {
            return Err("Warning message cannot be empty");
        }
        Ok(())
    }

    pub fn guard_settings(&self) -> GuardSettings {
        GuardSettings {
            throttle: ThrottleConfig {
                block_duration_ms: self.block_duration_ms,
                warning_throttle_ms: self.warning_throttle_ms,
            },
            api_level: ApiLevel(self.api_level),
            warning_message: self.warning_message.clone(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block_duration_ms = {}", self.block_duration_ms)?;
        writeln!(f, "warning_throttle_ms = {}", self.warning_throttle_ms)?;
        writeln!(f, "api_level = {}", self.api_level)?;
        write!(f, "warning_message = {:?}", self.warning_message)
    }
}
