//! Application configuration management.

use serde::Deserialize;

use crate::types::money::{DEFAULT_MONEY_SCALE, DEFAULT_RATE_SCALE, MAX_SCALE};
use crate::types::MoneyScale;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Computation engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Computation engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Decimal places kept on posted amounts.
    #[serde(default = "default_money_scale")]
    pub money_scale: u32,
    /// Decimal places kept on rates.
    #[serde(default = "default_rate_scale")]
    pub rate_scale: u32,
    /// Day-count divisor used when a branch has none configured.
    ///
    /// Unset means a branch without a divisor fails accrual validation.
    #[serde(default)]
    pub default_annual_divisor: Option<u32>,
}

fn default_money_scale() -> u32 {
    DEFAULT_MONEY_SCALE
}

fn default_rate_scale() -> u32 {
    DEFAULT_RATE_SCALE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            money_scale: DEFAULT_MONEY_SCALE,
            rate_scale: DEFAULT_RATE_SCALE,
            default_annual_divisor: None,
        }
    }
}

impl EngineConfig {
    /// Rounding scale derived from this configuration.
    #[must_use]
    pub const fn scale(&self) -> MoneyScale {
        MoneyScale::new(self.money_scale, self.rate_scale)
    }

    /// Rejects scales a `Decimal` cannot hold and a zero default divisor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending key.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        for (key, value) in [("money_scale", self.money_scale), ("rate_scale", self.rate_scale)] {
            if value > MAX_SCALE {
                return Err(config::ConfigError::Message(format!(
                    "engine.{key} must be at most {MAX_SCALE}, got {value}"
                )));
            }
        }
        if self.default_annual_divisor == Some(0) {
            return Err(config::ConfigError::Message(
                "engine.default_annual_divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier: `config/default`,
    /// `config/{RUN_MODE}`, then `ECOOP__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ECOOP").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.engine.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("ECOOP__DATABASE__URL", Some("postgres://localhost/ecoop_test")),
                ("ECOOP__ENGINE__DEFAULT_ANNUAL_DIVISOR", Some("360")),
            ],
            || {
                let cfg = AppConfig::load().unwrap();
                assert_eq!(cfg.database.url, "postgres://localhost/ecoop_test");
                assert_eq!(cfg.database.max_connections, 10);
                assert_eq!(cfg.engine.money_scale, 2);
                assert_eq!(cfg.engine.default_annual_divisor, Some(360));
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars_unset(["ECOOP__DATABASE__URL", "DATABASE_URL"], || {
            assert!(AppConfig::load().is_err());
        });
    }

    #[test]
    fn test_load_rejects_oversized_scale() {
        temp_env::with_vars(
            [
                ("ECOOP__DATABASE__URL", Some("postgres://localhost/ecoop_test")),
                ("ECOOP__ENGINE__MONEY_SCALE", Some("29")),
            ],
            || {
                let err = AppConfig::load().unwrap_err();
                assert!(err.to_string().contains("engine.money_scale"), "{err}");
            },
        );
    }

    #[test]
    fn test_engine_validate() {
        assert!(EngineConfig::default().validate().is_ok());
        let max = EngineConfig {
            money_scale: MAX_SCALE,
            rate_scale: MAX_SCALE,
            ..EngineConfig::default()
        };
        assert!(max.validate().is_ok());
        let rate = EngineConfig {
            rate_scale: MAX_SCALE + 1,
            ..EngineConfig::default()
        };
        assert!(rate.validate().is_err());
        let divisor = EngineConfig {
            default_annual_divisor: Some(0),
            ..EngineConfig::default()
        };
        assert!(divisor.validate().is_err());
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.scale(), MoneyScale::default());
        assert!(engine.default_annual_divisor.is_none());
    }
}
