//! CLI configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{CliError, CliResult};
use exbridge_domain::{ExchangeConfig, Precision, TradingPair};
use exbridge_exec::RetryPolicy;
use std::env;
use std::str::FromStr;

/// Variable lookup used while loading
type Vars<'a> = &'a dyn Fn(&str) -> Option<String>;

// =============================================================================
// Configuration
// =============================================================================

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Kraken account configuration
    pub kraken: KrakenConfig,

    /// Market and number formatting
    pub market: MarketConfig,

    /// Ticker retry budget
    pub ticker_retry: RetryPolicy,

    /// Log output format
    pub log_format: LogFormat,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// Kraken account configuration.
#[derive(Clone)]
pub struct KrakenConfig {
    /// Public API key
    pub api_key: String,
    /// Base64 private key
    pub api_secret: String,
    /// Restrict order placement to limit orders
    pub limit_only: bool,
}

/// Market configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Traded coin (e.g., "XMR")
    pub coin: String,
    /// Base asset (e.g., "XBT")
    pub base: String,
    /// Decimal places applied to amounts
    pub decimal_places: u32,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses the stub client)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> CliResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from a variable lookup.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        let vars: Vars<'_> = &vars;

        let environment = Self::load_environment(vars)?;
        let kraken = Self::load_kraken_config(vars, environment)?;
        let market = Self::load_market_config(vars)?;
        let ticker_retry = Self::load_retry_policy(vars)?;
        let log_format = Self::load_log_format(vars)?;

        Ok(Self {
            kraken,
            market,
            ticker_retry,
            log_format,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            kraken: KrakenConfig {
                api_key: String::new(),
                api_secret: String::new(),
                limit_only: true,
            },
            market: MarketConfig::default(),
            ticker_retry: RetryPolicy::immediate(4),
            log_format: LogFormat::Text,
            environment: Environment::Test,
        }
    }

    /// Exchange options for the adapter.
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig::new(
            self.kraken.api_key.clone(),
            self.kraken.api_secret.clone(),
            self.kraken.limit_only,
        )
    }

    /// Configured market.
    pub fn trading_pair(&self) -> CliResult<TradingPair> {
        Ok(TradingPair::new(self.market.coin.as_str(), self.market.base.as_str())?)
    }

    /// Configured precision.
    pub fn precision(&self) -> CliResult<Precision> {
        Ok(Precision::new(self.market.decimal_places)?)
    }

    fn load_environment(vars: Vars<'_>) -> CliResult<Environment> {
        let env_str = vars("EXBRIDGE_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(CliError::Config(format!(
                "Invalid EXBRIDGE_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_kraken_config(vars: Vars<'_>, environment: Environment) -> CliResult<KrakenConfig> {
        let api_key = vars("EXBRIDGE_KRAKEN_API_KEY").unwrap_or_default();
        let api_secret = vars("EXBRIDGE_KRAKEN_API_SECRET").unwrap_or_default();
        let limit_only = Self::load_parsed_env(vars, "EXBRIDGE_LIMIT_ONLY", true)?;

        if environment != Environment::Test && (api_key.is_empty() || api_secret.is_empty()) {
            return Err(CliError::Config(
                "EXBRIDGE_KRAKEN_API_KEY and EXBRIDGE_KRAKEN_API_SECRET are required".to_string(),
            ));
        }

        Ok(KrakenConfig {
            api_key,
            api_secret,
            limit_only,
        })
    }

    fn load_market_config(vars: Vars<'_>) -> CliResult<MarketConfig> {
        let defaults = MarketConfig::default();

        Ok(MarketConfig {
            coin: vars("EXBRIDGE_COIN").unwrap_or(defaults.coin),
            base: vars("EXBRIDGE_BASE").unwrap_or(defaults.base),
            decimal_places: Self::load_parsed_env(
                vars,
                "EXBRIDGE_DECIMAL_PLACES",
                defaults.decimal_places,
            )?,
        })
    }

    fn load_retry_policy(vars: Vars<'_>) -> CliResult<RetryPolicy> {
        let defaults = RetryPolicy::default();

        Ok(RetryPolicy {
            max_attempts: Self::load_parsed_env(
                vars,
                "EXBRIDGE_TICKER_ATTEMPTS",
                defaults.max_attempts,
            )?,
            initial_delay_ms: Self::load_parsed_env(
                vars,
                "EXBRIDGE_TICKER_BACKOFF_MS",
                defaults.initial_delay_ms,
            )?,
            max_delay_ms: Self::load_parsed_env(
                vars,
                "EXBRIDGE_TICKER_MAX_BACKOFF_MS",
                defaults.max_delay_ms,
            )?,
        })
    }

    fn load_log_format(vars: Vars<'_>) -> CliResult<LogFormat> {
        match vars("EXBRIDGE_LOG_FORMAT") {
            Some(val) => val.parse(),
            None => Ok(LogFormat::Text),
        }
    }

    fn load_parsed_env<T: FromStr>(vars: Vars<'_>, key: &str, default: T) -> CliResult<T> {
        match vars(key) {
            Some(val) => parse_value(key, &val),
            None => Ok(default),
        }
    }
}

/// Parse one variable's raw value, naming the variable on failure.
fn parse_value<T: FromStr>(key: &str, raw: &str) -> CliResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| CliError::Config(format!("Invalid {} value: {}", key, raw)))
}

impl FromStr for LogFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(CliError::Config(format!(
                "Invalid EXBRIDGE_LOG_FORMAT: {}. Expected: text, json",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kraken: KrakenConfig {
                api_key: String::new(),
                api_secret: String::new(),
                limit_only: true,
            },
            market: MarketConfig::default(),
            ticker_retry: RetryPolicy::default(),
            log_format: LogFormat::Text,
            environment: Environment::Development,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            coin: "XMR".to_string(),
            base: "XBT".to_string(),
            decimal_places: 8,
        }
    }
}

impl std::fmt::Debug for KrakenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("limit_only", &self.limit_only)
            .finish()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
