use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::reviews::ranking::{
    MeanSource, RankingConfig, DEFAULT_OUTSTANDING_THRESHOLD, DEFAULT_ROTATION_SECS,
};

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
    pub storage: StorageConfig,
    pub ranking: RankingConfig,
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

        let data_path = env::var("APP_DATA_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig { data_path },
            ranking: load_ranking()?,
        })
    }
}

fn load_ranking() -> Result<RankingConfig, ConfigError> {
    let outstanding_threshold = match env::var("APP_RANKING_THRESHOLD") {
        Ok(raw) => {
            RankingConfig::parse_threshold(&raw).ok_or(ConfigError::InvalidThreshold(raw))?
        }
        Err(_) => DEFAULT_OUTSTANDING_THRESHOLD,
    };

    let rotation_interval_secs = match env::var("APP_ROTATION_SECS") {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidRotation(raw))?,
        Err(_) => DEFAULT_ROTATION_SECS,
    };

    let mean_source = match env::var("APP_MEAN_SOURCE") {
        Ok(raw) => MeanSource::parse(&raw).ok_or(ConfigError::InvalidMeanSource(raw))?,
        Err(_) => MeanSource::default(),
    };

    Ok(RankingConfig {
        outstanding_threshold,
        mean_source,
        rotation_interval_secs,
    })
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
}

/// Where collections are persisted. `None` keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub data_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold(String),
    InvalidRotation(String),
    InvalidMeanSource(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold(value) => write!(
                f,
                "APP_RANKING_THRESHOLD must be a number between 1 and 5 (got '{value}')"
            ),
            ConfigError::InvalidRotation(value) => write!(
                f,
                "APP_ROTATION_SECS must be a positive number of seconds (got '{value}')"
            ),
            ConfigError::InvalidMeanSource(value) => write!(
                f,
                "APP_MEAN_SOURCE must be 'stored' or 'answers' (got '{value}')"
            ),
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
            "APP_DATA_PATH",
            "APP_RANKING_THRESHOLD",
            "APP_ROTATION_SECS",
            "APP_MEAN_SOURCE",
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
        assert!(config.storage.data_path.is_none());
        assert_eq!(config.ranking, RankingConfig::default());
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
    fn reads_ranking_and_storage_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RANKING_THRESHOLD", "4.2");
        env::set_var("APP_ROTATION_SECS", "9");
        env::set_var("APP_MEAN_SOURCE", "answers");
        env::set_var("APP_DATA_PATH", "/var/lib/branch-review/data.json");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.ranking.outstanding_threshold, 4.2);
        assert_eq!(config.ranking.rotation_interval_secs, 9);
        assert_eq!(config.ranking.mean_source, MeanSource::PreferAnswers);
        assert_eq!(
            config.storage.data_path,
            Some(PathBuf::from("/var/lib/branch-review/data.json"))
        );
        reset_env();
    }

    #[test]
    fn rejects_threshold_outside_rating_scale() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RANKING_THRESHOLD", "7");
        let error = AppConfig::load().expect_err("threshold above 5 is rejected");
        assert!(matches!(error, ConfigError::InvalidThreshold(_)));

        env::set_var("APP_RANKING_THRESHOLD", "NaN");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidThreshold(_))
        ));
        reset_env();
    }

    #[test]
    fn rejects_zero_rotation_and_unknown_mean_source() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ROTATION_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidRotation(_))
        ));

        reset_env();
        env::set_var("APP_MEAN_SOURCE", "median");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidMeanSource(_))
        ));
        reset_env();
    }
}
