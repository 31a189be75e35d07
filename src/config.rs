use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::patterns::types::Autonomy;

/// Tunables for both engines. Every key is optional in the TOML file;
/// missing keys fall back to the defaults below.
///
/// ```toml
/// [intent]
/// confidence_threshold = 0.6
///
/// [patterns]
/// postpone_autonomy = "auto"
/// max_suggestions_per_day = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub intent: IntentConfig,
    pub patterns: PatternConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Minimum score for a candidate to be acted on (after confirmation).
    pub confidence_threshold: f32,
    /// Candidates below the threshold but above this floor become suggestions.
    pub suggestion_floor: f32,
    pub max_suggestions: usize,
    pub recent_intent_limit: usize,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            suggestion_floor: 0.2,
            max_suggestions: 3,
            recent_intent_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub postpone_threshold: u32,
    pub postpone_autonomy: Autonomy,
    pub deadline_threshold_days: u32,
    pub deadline_autonomy: Autonomy,
    pub auto_client_autonomy: Autonomy,
    pub max_suggestions_per_day: u32,
    pub max_suggestions_per_week: u32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            postpone_threshold: 3,
            postpone_autonomy: Autonomy::Ask,
            deadline_threshold_days: 2,
            deadline_autonomy: Autonomy::Ask,
            auto_client_autonomy: Autonomy::Off,
            max_suggestions_per_day: 3,
            max_suggestions_per_week: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub interval_secs: u64,
    pub debounce_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            debounce_ms: 2_000,
        }
    }
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl EngineConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml_str(&contents).map_err(|source| match source {
                    ConfigError::Parse { source, .. } => ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    },
                    other => other,
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: Default::default(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intent = &self.intent;
        if !(0.0..=1.0).contains(&intent.confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "intent.confidence_threshold",
                reason: format!("{} is outside [0, 1]", intent.confidence_threshold),
            });
        }
        if !(0.0..=1.0).contains(&intent.suggestion_floor)
            || intent.suggestion_floor >= intent.confidence_threshold
        {
            return Err(ConfigError::Invalid {
                field: "intent.suggestion_floor",
                reason: format!(
                    "{} must be in [0, confidence_threshold)",
                    intent.suggestion_floor
                ),
            });
        }
        if self.patterns.max_suggestions_per_week < self.patterns.max_suggestions_per_day {
            return Err(ConfigError::Invalid {
                field: "patterns.max_suggestions_per_week",
                reason: "weekly quota is smaller than the daily quota".to_string(),
            });
        }
        if self.scan.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "scan.interval_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
