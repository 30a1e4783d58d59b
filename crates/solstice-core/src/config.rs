use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_HORIZON_DAYS, DEFAULT_MAX_OCCURRENCES};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub expansion: ExpansionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionConfig {
    /// Days past "now" an open-ended rule is expanded when the caller
    /// supplies no window end.
    pub horizon_days: i64,
    /// Hard cap on occurrences generated for a single rule.
    pub max_occurrences: usize,
}

impl ExpansionConfig {
    /// ## Summary
    /// Returns the horizon as a duration, for deriving a default window end
    /// from the caller's clock.
    #[must_use]
    pub fn horizon(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::days(self.horizon_days)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("expansion.horizon_days", DEFAULT_HORIZON_DAYS)?
            .set_default("expansion.max_occurrences", DEFAULT_MAX_OCCURRENCES as u64)?
            .set_default("logging.level", "debug")?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(
        horizon_days = settings.expansion.horizon_days,
        max_occurrences = settings.expansion.max_occurrences,
        "Loaded engine configuration"
    );
    Ok(settings)
}
