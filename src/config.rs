use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub wagering: WageringConfig,
    #[serde(default)]
    pub quotes: QuotesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct WageringConfig {
    /// Balance granted to newly registered accounts (play money)
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Decimal,
    /// Smallest deposit a user may request
    #[serde(default = "default_min_transaction")]
    pub min_deposit: Decimal,
    /// Smallest withdrawal a user may request
    #[serde(default = "default_min_transaction")]
    pub min_withdrawal: Decimal,
    /// Smallest stake accepted by the casino games
    #[serde(default = "default_min_casino_stake")]
    pub min_casino_stake: Decimal,
}

fn default_starting_balance() -> Decimal {
    Decimal::new(10_000_00, 2) // 10000.00
}

fn default_min_transaction() -> Decimal {
    Decimal::new(100, 2) // 1.00
}

fn default_min_casino_stake() -> Decimal {
    Decimal::new(100, 2) // 1.00
}

impl Default for WageringConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            min_deposit: default_min_transaction(),
            min_withdrawal: default_min_transaction(),
            min_casino_stake: default_min_casino_stake(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotesConfig {
    /// Run the simulated market feed
    #[serde(default = "default_quotes_enabled")]
    pub enabled: bool,
    /// Symbols shown on the market board
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Feed refresh interval in milliseconds
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

fn default_quotes_enabled() -> bool {
    true
}

fn default_symbols() -> Vec<String> {
    ["AAPL", "GOOG", "MSFT", "AMZN", "TSLA"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_refresh_ms() -> u64 {
    1000
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            enabled: default_quotes_enabled(),
            symbols: default_symbols(),
            refresh_ms: default_refresh_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 5)?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PUNT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PUNT_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("PUNT")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration pointing at a local database
    pub fn default_config(database_url: &str) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseConfig {
                url: database_url.to_string(),
                max_connections: default_max_connections(),
                connect_timeout_secs: default_connect_timeout_secs(),
            },
            wagering: WageringConfig::default(),
            quotes: QuotesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.url.is_empty() {
            errors.push("database.url must be set".to_string());
        }

        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be positive".to_string());
        }

        if self.wagering.starting_balance < Decimal::ZERO {
            errors.push("wagering.starting_balance must not be negative".to_string());
        }

        if self.wagering.min_deposit <= Decimal::ZERO {
            errors.push("wagering.min_deposit must be positive".to_string());
        }

        if self.wagering.min_withdrawal <= Decimal::ZERO {
            errors.push("wagering.min_withdrawal must be positive".to_string());
        }

        if self.wagering.min_casino_stake <= Decimal::ZERO {
            errors.push("wagering.min_casino_stake must be positive".to_string());
        }

        if self.quotes.enabled {
            if self.quotes.symbols.is_empty() {
                errors.push("quotes.symbols must not be empty when the feed is enabled".to_string());
            }
            if self.quotes.refresh_ms < 100 {
                errors.push("quotes.refresh_ms must be at least 100".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default_config("postgres://localhost/punt");
        assert!(config.validate().is_ok());
        assert_eq!(config.wagering.starting_balance, dec!(10000.00));
    }

    #[test]
    fn test_validate_collects_all_failures() {
        let mut config = AppConfig::default_config("");
        config.wagering.min_deposit = dec!(0);
        config.quotes.refresh_ms = 10;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
