use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::staffing::{BanPolicy, BucketPolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub marketplace: MarketplaceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let ansi = flag_var("APP_LOG_ANSI", false)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            marketplace: MarketplaceConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Business rules that operators can tune without a redeploy.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceConfig {
    pub bucket: BucketPolicy,
    pub ban: BanPolicy,
    pub reputation_cache_ttl: Duration,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            bucket: BucketPolicy::default(),
            ban: BanPolicy::default(),
            reputation_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl MarketplaceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let threshold = number_var("APP_BAN_THRESHOLD")?
            .map(|value| value as u32)
            .unwrap_or(defaults.ban.threshold);
        if threshold == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "APP_BAN_THRESHOLD",
            });
        }
        let duration_days = number_var("APP_BAN_DURATION_DAYS")?
            .map(|value| value as i64)
            .unwrap_or(defaults.ban.duration_days);
        let lookback_days = number_var("APP_BAN_LOOKBACK_DAYS")?
            .map(|value| value as i64)
            .or(defaults.ban.lookback_days);

        let enforce_quota = flag_var("APP_ENFORCE_HELPER_QUOTA", defaults.bucket.enforce_quota)?;
        let block_banned = flag_var(
            "APP_BLOCK_BANNED_SEEKERS",
            defaults.bucket.block_banned_seekers,
        )?;

        let reputation_cache_ttl = number_var("APP_REPUTATION_CACHE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.reputation_cache_ttl);

        Ok(Self {
            bucket: BucketPolicy {
                enforce_quota,
                block_banned_seekers: block_banned,
            },
            ban: BanPolicy {
                threshold,
                duration_days,
                lookback_days,
            },
            reputation_cache_ttl,
        })
    }
}

fn number_var(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(|value| Some(u64::from(value)))
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(None),
    }
}

fn flag_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_ANSI",
            "APP_BAN_THRESHOLD",
            "APP_BAN_DURATION_DAYS",
            "APP_BAN_LOOKBACK_DAYS",
            "APP_ENFORCE_HELPER_QUOTA",
            "APP_BLOCK_BANNED_SEEKERS",
            "APP_REPUTATION_CACHE_TTL_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.ansi);
        assert_eq!(config.marketplace, MarketplaceConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_ban_policy_and_bucket_flags() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_BAN_THRESHOLD", "2");
        env::set_var("APP_BAN_DURATION_DAYS", "14");
        env::set_var("APP_BAN_LOOKBACK_DAYS", "60");
        env::set_var("APP_ENFORCE_HELPER_QUOTA", "off");
        env::set_var("APP_BLOCK_BANNED_SEEKERS", "yes");
        env::set_var("APP_REPUTATION_CACHE_TTL_SECS", "0");

        let config = AppConfig::load().expect("config loads");
        let marketplace = config.marketplace;
        assert_eq!(marketplace.ban.threshold, 2);
        assert_eq!(marketplace.ban.duration_days, 14);
        assert_eq!(marketplace.ban.lookback_days, Some(60));
        assert!(!marketplace.bucket.enforce_quota);
        assert!(marketplace.bucket.block_banned_seekers);
        assert_eq!(marketplace.reputation_cache_ttl, Duration::ZERO);
        reset_env();
    }

    #[test]
    fn rejects_zero_ban_threshold_and_garbled_flags() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_BAN_THRESHOLD", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "APP_BAN_THRESHOLD"
            })
        ));

        reset_env();
        env::set_var("APP_ENFORCE_HELPER_QUOTA", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag {
                key: "APP_ENFORCE_HELPER_QUOTA"
            })
        ));
        reset_env();
    }
}
