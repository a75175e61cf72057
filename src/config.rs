//! Run configuration for the pinggrid binary and library.
//!
//! Provides:
//! - `RunConfig`: validated settings for one run (destinations, rounds, pacing)
//! - `AppConfig`: optional YAML defaults file
//! - `load_destinations`: destinations list file, one entry per line

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Default number of probe rounds.
pub const DEFAULT_ITERATIONS: u32 = 5;

/// Default minimum gap between round starts (1 second).
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default latency bound below which a reply counts as fast (50 ms).
pub const DEFAULT_FAST_THRESHOLD: Duration = Duration::from_millis(50);

/// Default latency bound at which a reply becomes a warning (500 ms).
pub const DEFAULT_WARNING_THRESHOLD: Duration = Duration::from_millis(500);

/// Default latency bound at which a reply counts as an error (1 second).
pub const DEFAULT_ERROR_THRESHOLD: Duration = Duration::from_millis(1000);

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration or destinations file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

// =============================================================================
// Thresholds
// =============================================================================

/// Latency bounds controlling how reply cells are styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Replies strictly below this are fast (default: 50ms).
    #[serde(with = "humantime_serde")]
    pub fast: Duration,

    /// Replies at or above this are warnings (default: 500ms).
    #[serde(with = "humantime_serde")]
    pub warning: Duration,

    /// Replies at or above this are errors (default: 1s).
    #[serde(with = "humantime_serde")]
    pub error: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_THRESHOLD,
            warning: DEFAULT_WARNING_THRESHOLD,
            error: DEFAULT_ERROR_THRESHOLD,
        }
    }
}

// =============================================================================
// Iterations
// =============================================================================

/// Number of rounds a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    /// Run exactly this many rounds.
    Count(u32),
    /// Keep running until stopped.
    Unbounded,
}

impl Iterations {
    /// Whether the zero-based `round` lies past the end of the run.
    pub fn is_done(&self, round: usize) -> bool {
        match self {
            Self::Count(n) => round >= *n as usize,
            Self::Unbounded => false,
        }
    }
}

impl std::fmt::Display for Iterations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{} rounds", n),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

// =============================================================================
// Run Configuration
// =============================================================================

/// Validated settings for a single run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Destinations probed each round, in column order.
    pub destinations: Vec<String>,

    /// How many rounds to execute.
    pub iterations: Iterations,

    /// Minimum gap between consecutive round starts.
    pub interval: Duration,

    /// Latency styling thresholds.
    pub thresholds: Thresholds,
}

impl RunConfig {
    /// Create a run configuration with default round count, pacing, and
    /// thresholds.
    ///
    /// An empty destination list is allowed; rounds then produce empty rows.
    pub fn new(destinations: Vec<String>) -> Self {
        Self {
            destinations,
            iterations: Iterations::Count(DEFAULT_ITERATIONS),
            interval: DEFAULT_INTERVAL,
            thresholds: Thresholds::default(),
        }
    }

    /// Set the round count.
    pub fn with_iterations(mut self, iterations: Iterations) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the minimum gap between round starts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the latency styling thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Iterations::Count(0) = self.iterations {
            return Err(ConfigError::ValidationError(
                "iterations must be at least 1".to_string(),
            ));
        }
        validate_interval(self.interval)?;
        validate_thresholds(&self.thresholds)?;
        Ok(())
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Defaults loaded from an optional YAML file.
///
/// Command-line arguments override all of these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default round count (default: 5).
    pub iterations: u32,

    /// Default minimum gap between round starts (default: 1s).
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Latency styling thresholds.
    pub thresholds: Thresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            interval: default_interval(),
            thresholds: Thresholds::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ValidationError(
                "iterations must be at least 1".to_string(),
            ));
        }
        validate_interval(self.interval)?;
        validate_thresholds(&self.thresholds)?;
        Ok(())
    }
}

// =============================================================================
// Destinations File
// =============================================================================

/// Read a destinations list from a file, one entry per line.
///
/// Lines are trimmed; blank lines and `#` comments are skipped.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read or yields no destinations.
pub fn load_destinations(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let destinations: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if destinations.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "no destinations found in '{}'",
            path.as_ref().display()
        )));
    }
    Ok(destinations)
}

// =============================================================================
// Validation Helpers
// =============================================================================

fn validate_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval < Duration::from_millis(1) {
        return Err(ConfigError::ValidationError(
            "interval must be at least 1ms".to_string(),
        ));
    }
    Ok(())
}

fn validate_thresholds(thresholds: &Thresholds) -> Result<(), ConfigError> {
    if thresholds.fast > thresholds.warning || thresholds.warning > thresholds.error {
        return Err(ConfigError::ValidationError(format!(
            "thresholds must be ordered fast <= warning <= error, got {:?} / {:?} / {:?}",
            thresholds.fast, thresholds.warning, thresholds.error
        )));
    }
    Ok(())
}
