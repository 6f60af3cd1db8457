//! Solver configuration.
//!
//! Two knobs bound every solve: the low-level horizon factor and the
//! driver's round budget. Both are loadable from TOML so deployments can
//! tune them without recompiling; both reject zero, which would make a
//! solve trivially impossible.

use serde::Deserialize;

use concord_contracts::error::{ConcordError, ConcordResult};

/// Tunable parameters for one solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// The low-level search horizon as a multiple of each agent's
    /// unconstrained shortest-path length.
    pub horizon_factor: u32,
    /// Maximum number of synchronous rounds before the driver gives up
    /// with `RoundLimitExceeded`.
    pub max_rounds: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            horizon_factor: 3,
            max_rounds: 10_000,
        }
    }
}

/// Mirror of the TOML shape; absent keys fall back to the defaults.
#[derive(Debug, Deserialize)]
struct RawConfig {
    horizon_factor: Option<u32>,
    max_rounds: Option<u32>,
}

impl SolverConfig {
    /// Parse a configuration from TOML text.
    ///
    /// ```toml
    /// horizon_factor = 4
    /// max_rounds = 2000
    /// ```
    pub fn from_toml_str(text: &str) -> ConcordResult<Self> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConcordError::ConfigError {
            reason: format!("failed to parse solver config: {}", e),
        })?;

        let defaults = Self::default();
        let config = Self {
            horizon_factor: raw.horizon_factor.unwrap_or(defaults.horizon_factor),
            max_rounds: raw.max_rounds.unwrap_or(defaults.max_rounds),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConcordResult<()> {
        if self.horizon_factor == 0 {
            return Err(ConcordError::ConfigError {
                reason: "horizon_factor must be at least 1".to_string(),
            });
        }
        if self.max_rounds == 0 {
            return Err(ConcordError::ConfigError {
                reason: "max_rounds must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
