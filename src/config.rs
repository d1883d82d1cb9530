use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENHANCED_SELECT_CLASS: &str = "searchable-select";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read cascade config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
}

/// Timing and matching knobs for the suggestion cascade.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CascadeConfig {
    pub start_delay_ms: u64,
    pub segment_settle_ms: u64,
    pub domain_settle_ms: u64,
    pub other_domain_initial_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub max_attempts: u32,
    /// Write the raw other-domain values once before falling back to the
    /// matching loop.
    pub eager_direct_write: bool,
    pub direct_write_check_ms: u64,
    pub enhanced_select_class: String,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 1_000,
            segment_settle_ms: 1_000,
            domain_settle_ms: 2_000,
            other_domain_initial_delay_ms: 3_000,
            retry_delay_ms: 1_000,
            max_attempts: 8,
            eager_direct_write: false,
            direct_write_check_ms: 1_000,
            enhanced_select_class: DEFAULT_ENHANCED_SELECT_CLASS.to_string(),
        }
    }
}

impl CascadeConfig {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                serde_yaml::from_str::<CascadeConfig>(&contents)?
            }
            _ => CascadeConfig::default(),
        };

        if config.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        Ok(config)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn segment_settle(&self) -> Duration {
        Duration::from_millis(self.segment_settle_ms)
    }

    pub fn domain_settle(&self) -> Duration {
        Duration::from_millis(self.domain_settle_ms)
    }

    pub fn other_domain_initial_delay(&self) -> Duration {
        Duration::from_millis(self.other_domain_initial_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn direct_write_check(&self) -> Duration {
        Duration::from_millis(self.direct_write_check_ms)
    }
}
