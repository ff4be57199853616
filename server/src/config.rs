//! Configuration management for the server.

use marketsync_engine::WritePolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default Trendyol integration gateway.
pub const TRENDYOL_DEFAULT_BASE_URL: &str = "https://apigw.trendyol.com/integration";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL. Without it the store lives in memory only.
    pub database_url: Option<String>,
    /// Outbound request timeout
    pub http_timeout: Duration,
    pub sync: SyncSettings,
    /// Trendyol credentials; `None` leaves the platform unregistered
    pub trendyol: Option<TrendyolConfig>,
}

/// Scheduler and reconciliation settings.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub enabled: bool,
    pub interval: Duration,
    /// Delay before the first scheduled run
    pub warmup: Duration,
    pub write_policy: WritePolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5 * 60),
            warmup: Duration::from_secs(30),
            write_policy: WritePolicy::AlwaysWrite,
        }
    }
}

/// Trendyol seller API access.
#[derive(Clone)]
pub struct TrendyolConfig {
    pub api_key: String,
    pub api_secret: String,
    pub supplier_id: String,
    pub base_url: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub settlement_lookback_days: i64,
}

impl std::fmt::Debug for TrendyolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendyolConfig")
            .field("supplier_id", &self.supplier_id)
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("settlement_lookback_days", &self.settlement_lookback_days)
            .finish_non_exhaustive()
    }
}

impl TrendyolConfig {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        supplier_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            supplier_id: supplier_id.into(),
            base_url: TRENDYOL_DEFAULT_BASE_URL.to_string(),
            page_size: 200,
            max_pages: 100,
            settlement_lookback_days: 14,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = var("DATABASE_URL");

        let http_timeout =
            Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", var("HTTP_TIMEOUT_SECS"), 30)?);

        let defaults = SyncSettings::default();
        let sync = SyncSettings {
            enabled: parse_bool("SYNC_ENABLED", var("SYNC_ENABLED"), defaults.enabled)?,
            interval: Duration::from_secs(
                60 * parse_or::<u64>("SYNC_INTERVAL_MINUTES", var("SYNC_INTERVAL_MINUTES"), 5)?,
            ),
            warmup: Duration::from_secs(parse_or("SYNC_WARMUP_SECS", var("SYNC_WARMUP_SECS"), 30)?),
            write_policy: match var("SYNC_WRITE_POLICY").as_deref() {
                None | Some("always") => WritePolicy::AlwaysWrite,
                Some("on-change") => WritePolicy::OnChange,
                Some(other) => {
                    return Err(ConfigError::InvalidValue {
                        name: "SYNC_WRITE_POLICY",
                        value: other.to_string(),
                    })
                }
            },
        };
        if sync.interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "SYNC_INTERVAL_MINUTES",
                value: "0".to_string(),
            });
        }

        let trendyol = match (
            var("TRENDYOL_API_KEY"),
            var("TRENDYOL_API_SECRET"),
            var("TRENDYOL_SUPPLIER_ID"),
        ) {
            (None, None, None) => None,
            (Some(key), Some(secret), Some(supplier)) => {
                let mut trendyol = TrendyolConfig::new(key, secret, supplier);
                if let Some(url) = var("TRENDYOL_BASE_URL") {
                    trendyol.base_url = url;
                }
                trendyol.page_size =
                    parse_or("TRENDYOL_PAGE_SIZE", var("TRENDYOL_PAGE_SIZE"), 200)?;
                trendyol.max_pages =
                    parse_or("TRENDYOL_MAX_PAGES", var("TRENDYOL_MAX_PAGES"), 100)?;
                trendyol.settlement_lookback_days = parse_or(
                    "TRENDYOL_SETTLEMENT_LOOKBACK_DAYS",
                    var("TRENDYOL_SETTLEMENT_LOOKBACK_DAYS"),
                    14,
                )?;
                Some(trendyol)
            }
            (key, secret, supplier) => {
                let missing = [
                    ("TRENDYOL_API_KEY", key.is_none()),
                    ("TRENDYOL_API_SECRET", secret.is_none()),
                    ("TRENDYOL_SUPPLIER_ID", supplier.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
                .join(", ");
                return Err(ConfigError::IncompleteCredentials { missing });
            }
        };

        Ok(Self {
            host,
            port,
            database_url,
            http_timeout,
            sync,
            trendyol,
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::InvalidValue { name, value }),
        },
    }
}

fn parse_bool(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid {name} value: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Trendyol credentials are incomplete, missing: {missing}")]
    IncompleteCredentials { missing: String },
}
