// Configuration for the proxy service:
// - Runtime environment and its profile (CORS origins, error verbosity)
// - Upstream SentiChain endpoint, API key and network
// - Server listening address/port
// - Edge rate limiting
// - Cache settings (max age, capacity)

use dotenv::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const API_VERSION: &str = "1.0.0";

/// Longest accepted `CACHE_MAX_AGE_SECS` (30 days).
pub const MAX_CACHE_AGE_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown environment: {0}. Expected 'development', 'production' or 'test'")]
    UnknownEnvironment(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Deployment environment, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    /// Whether upstream failure details may be returned to clients.
    pub fn exposes_error_details(&self) -> bool {
        !matches!(self, Environment::Production)
    }

    pub fn default_cors_origins(&self) -> Vec<String> {
        match self {
            Environment::Production => vec!["https://sentimove.com".to_string()],
            Environment::Development | Environment::Test => vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_url: String,
    pub api_key: String,
    pub network: String,
    pub upstream_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub cache_max_age: Duration,
    pub cache_max_capacity: u64,
    pub processed_by: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let environment = env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .parse::<Environment>()?;

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            _ => environment.default_cors_origins(),
        };

        let rate_limit = RateLimitConfig {
            window: Duration::from_secs(parse_var("RATE_LIMIT_WINDOW_SECS", 15 * 60)?),
            max_requests: parse_var("RATE_LIMIT_MAX", 100)?,
        };

        Ok(Self {
            environment,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_var("PORT", 3000)?,
            api_base_url: env::var("SENTICHAIN_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.sentichain.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: env::var("SENTICHAIN_API_KEY").unwrap_or_else(|_| "abc123".to_string()),
            network: env::var("SENTICHAIN_NETWORK").unwrap_or_else(|_| "mainnet".to_string()),
            upstream_timeout: Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", 30)?),
            cors_origins,
            rate_limit,
            cache_max_age: cache_max_age(parse_var("CACHE_MAX_AGE_SECS", 60 * 60)?)?,
            cache_max_capacity: parse_var("CACHE_MAX_CAPACITY", 10_000)?,
            processed_by: "SentiMove Server v1.0".to_string(),
        })
    }

    /// Defaults for the given environment without reading the process environment.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            api_base_url: "https://api.sentichain.com".to_string(),
            api_key: "abc123".to_string(),
            network: "mainnet".to_string(),
            upstream_timeout: Duration::from_secs(30),
            cors_origins: environment.default_cors_origins(),
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(15 * 60),
                max_requests: 100,
            },
            cache_max_age: Duration::from_secs(60 * 60),
            cache_max_capacity: 10_000,
            processed_by: "SentiMove Server v1.0".to_string(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn cache_max_age(secs: u64) -> Result<Duration, ConfigError> {
    if secs > MAX_CACHE_AGE_SECS {
        return Err(ConfigError::InvalidValue {
            name: "CACHE_MAX_AGE_SECS",
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(" test ".parse::<Environment>().unwrap(), Environment::Test);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_profiles() {
        assert!(!Environment::Production.exposes_error_details());
        assert!(Environment::Development.exposes_error_details());
        assert_eq!(
            Environment::Production.default_cors_origins(),
            vec!["https://sentimove.com".to_string()]
        );
        assert_eq!(Environment::Development.default_cors_origins().len(), 2);
    }

    #[test]
    fn test_for_environment_defaults() {
        let config = Config::for_environment(Environment::Test);
        assert_eq!(config.cache_max_age, Duration::from_secs(3600));
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(900));
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_cache_max_age_bounds() {
        assert_eq!(cache_max_age(3600).unwrap(), Duration::from_secs(3600));
        assert_eq!(
            cache_max_age(MAX_CACHE_AGE_SECS).unwrap(),
            Duration::from_secs(MAX_CACHE_AGE_SECS)
        );

        let err = cache_max_age(10_000_000_000).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for CACHE_MAX_AGE_SECS: 10000000000");
    }
}
