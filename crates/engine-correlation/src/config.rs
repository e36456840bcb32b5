//! Engine session configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How to locate, launch and configure the analysis engine.
///
/// Deserialized from the `[engine]` table of the tool's TOML config; every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit engine executable. When unset the binary is picked from
    /// `engine_dir` by platform.
    pub path: Option<PathBuf>,
    /// Extra command-line arguments for the engine.
    pub args: Vec<String>,
    /// Directory holding the per-platform engine binaries.
    pub engine_dir: PathBuf,
    /// Value for the `Threads` option.
    pub threads: u32,
    /// Value for the `Hash` option, in megabytes.
    pub hash_mb: u32,
    /// Fraction of the initial wait added on every polling cycle.
    pub wait_growth: f64,
    /// Poll interval for handshake and `isready` exchanges, in milliseconds.
    pub poll_ms: u64,
    /// Upper bound on one response, in milliseconds. Unset waits indefinitely.
    pub max_wait_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            engine_dir: PathBuf::from("engines"),
            threads: 1,
            hash_mb: 16,
            wait_growth: 0.5,
            poll_ms: 10,
            max_wait_ms: None,
        }
    }
}

/// Largest accepted `wait_growth`.
pub const MAX_WAIT_GROWTH: f64 = 100.0;

impl EngineConfig {
    /// Reject settings that cannot drive a polling schedule.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending field: a `wait_growth`
    /// that is not a finite number between 0 and [`MAX_WAIT_GROWTH`].
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=MAX_WAIT_GROWTH).contains(&self.wait_growth) {
            return Err(format!(
                "wait_growth must be between 0 and {MAX_WAIT_GROWTH}, got {}",
                self.wait_growth
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.hash_mb, 16);
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.max_wait(), None);
        assert!(config.path.is_none());
    }

    #[test]
    fn test_validate_wait_growth() {
        assert!(EngineConfig::default().validate().is_ok());
        for growth in [-0.5, 1e21, f64::NAN, f64::INFINITY] {
            let config = EngineConfig {
                wait_growth: growth,
                ..EngineConfig::default()
            };
            let message = config.validate().unwrap_err();
            assert!(message.contains("wait_growth"), "{message}");
        }
        let edge = EngineConfig {
            wait_growth: MAX_WAIT_GROWTH,
            ..EngineConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_max_wait_conversion() {
        let config = EngineConfig {
            max_wait_ms: Some(1500),
            ..EngineConfig::default()
        };
        assert_eq!(config.max_wait(), Some(Duration::from_millis(1500)));
    }
}
