//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Smallest accepted daily goal, in minutes.
pub const MIN_DAILY_GOAL_MINUTES: u32 = 5;

/// Largest accepted daily goal, in minutes (8 hours).
pub const MAX_DAILY_GOAL_MINUTES: u32 = 480;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trend window size used when the caller does not pass one.
    pub default_trend_days: u32,

    /// Daily focus goal in minutes, used for goal-progress reporting.
    pub daily_goal_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_trend_days: 30,
            daily_goal_minutes: 25,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    ///
    /// Layering, later wins: built-in defaults, then `config.toml` in the
    /// platform config directory, then the given file, then `FT_*`
    /// environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("FT_"));

        let config: Self = figment.extract()?;
        config.validated()
    }

    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    fn validated(self) -> Result<Self, figment::Error> {
        if self.default_trend_days == 0 {
            return Err(figment::Error::from(
                "default_trend_days must be at least 1".to_string(),
            ));
        }
        if !(MIN_DAILY_GOAL_MINUTES..=MAX_DAILY_GOAL_MINUTES).contains(&self.daily_goal_minutes) {
            return Err(figment::Error::from(format!(
                "daily_goal_minutes must be between {MIN_DAILY_GOAL_MINUTES} and {MAX_DAILY_GOAL_MINUTES}, got {}",
                self.daily_goal_minutes
            )));
        }
        Ok(self)
    }
}

/// Returns the platform-specific config directory for the focus tracker.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("focus-tracker"))
}
