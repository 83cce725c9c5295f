use std::{env, net::IpAddr, str::FromStr, time::Duration};

use dotenvy::dotenv;
use log::{debug, info, warn};
use serde::Deserialize;

pub use crate::errors::ConfigError;
use crate::utils::hash::HASH_CODE_LENGTH;

// Server-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub workers: usize,
    /// Absolute base used when echoing short URLs back to clients.
    /// Falls back to the request's own scheme and host when unset.
    pub public_base_url: Option<String>,
    /// Enables the unauthenticated `GET /api/create` endpoint
    pub public_create_api: bool,
}

// Application-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub log_level: String,
}

// Environment enum for different deployment environments
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

// Implement FromStr trait for Environment enum to enable parsing from string
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!(
                "Invalid environment: {}. Must be one of: development, testing, production",
                s
            )),
        }
    }
}

// Result type for configuration functions
type ConfigResult<T> = Result<T, ConfigError>;

/// Connection settings for the key-value backend
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `redis://[:password@]host:port[/db]`
    pub url: String,
    pub connect_timeout_seconds: u64,
    pub operation_timeout_ms: u64,
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Policy knobs for code generation and URL normalization
#[derive(Debug, Clone, Deserialize)]
pub struct ShortenerConfig {
    pub key_prefix: String,
    pub code_length: usize,
    pub max_attempts: usize,
    pub strip_query: bool,
    pub strip_anchor: bool,
    pub required_host: Option<String>,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            key_prefix: "shortener:hash:".to_string(),
            code_length: 6,
            max_attempts: 8,
            strip_query: false,
            strip_anchor: false,
            required_host: None,
        }
    }
}

impl ShortenerConfig {
    /// Checks that every generated candidate fits inside the hash encoding.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "SHORTENER_KEY_PREFIX must not be empty".to_string(),
            ));
        }
        if self.code_length == 0 || self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "SHORTENER_CODE_LENGTH and SHORTENER_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        let longest = self.code_length + self.max_attempts - 1;
        if longest > HASH_CODE_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "code length {} with {} attempts needs {} characters, at most {} available",
                self.code_length, self.max_attempts, longest, HASH_CODE_LENGTH
            )));
        }
        Ok(())
    }
}

/// Basic-auth credentials. Auth is disabled when `user` is unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn is_enabled(&self) -> bool {
        self.user.is_some()
    }
}

// Config struct that matches our environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub store: StoreConfig,
    pub shortener: ShortenerConfig,
    pub auth: AuthConfig,
}

impl Config {
    // Load configuration from environment variables
    pub fn load() -> ConfigResult<Self> {
        // Load .env file if it exists
        match dotenv() {
            Ok(_) => debug!(".env file loaded successfully"),
            Err(e) => warn!("Could not load .env file: {}", e),
        }

        // Create the server config
        let server = ServerConfig {
            host: get_env_or_default("SERVER_HOST", "127.0.0.1")?,
            port: get_env_or_default("SERVER_PORT", "8000")?,
            workers: get_env_or_default("SERVER_WORKERS", "4")?,
            public_base_url: get_env_optional("PUBLIC_BASE_URL")?,
            public_create_api: get_env_or_default("PUBLIC_CREATE_API", "false")?,
        };

        // Get version from Cargo.toml or environment
        let version = option_env!("CARGO_PKG_VERSION")
            .unwrap_or("0.1.0")
            .to_string();

        // Create the app config
        let app = AppConfig {
            name: get_env_or_default("APP_NAME", "shorty")?,
            version: env::var("APP_VERSION").unwrap_or(version),
            environment: get_env_or_default("APP_ENVIRONMENT", "development")?,
            log_level: get_env_or_default("RUST_LOG", "info")?,
        };

        let store = StoreConfig {
            url: get_env_or_default("REDIS_URL", "redis://127.0.0.1:6379")?,
            connect_timeout_seconds: get_env_or_default("REDIS_CONNECT_TIMEOUT_SECONDS", "5")?,
            operation_timeout_ms: get_env_or_default("REDIS_OPERATION_TIMEOUT_MS", "2000")?,
        };

        let defaults = ShortenerConfig::default();
        let shortener = ShortenerConfig {
            key_prefix: get_env_or_default("SHORTENER_KEY_PREFIX", &defaults.key_prefix)?,
            code_length: get_env_or_default(
                "SHORTENER_CODE_LENGTH",
                &defaults.code_length.to_string(),
            )?,
            max_attempts: get_env_or_default(
                "SHORTENER_MAX_ATTEMPTS",
                &defaults.max_attempts.to_string(),
            )?,
            strip_query: get_env_or_default("SHORTENER_STRIP_QUERY", "false")?,
            strip_anchor: get_env_or_default("SHORTENER_STRIP_ANCHOR", "false")?,
            required_host: get_env_optional("SHORTENER_REQUIRED_HOST")?,
        };
        shortener.validate()?;

        let auth = AuthConfig {
            user: get_env_optional("HTTP_USER")?,
            password: get_env_optional("HTTP_PASS")?,
        };
        if !auth.is_enabled() {
            warn!("HTTP_USER not set, write endpoints are unauthenticated");
        }

        let config = Config {
            server,
            app,
            store,
            shortener,
            auth,
        };
        info!("Configuration loaded successfully");
        debug!("Loaded config: {:?}", config.redacted());

        Ok(config)
    }

    /// Copy safe to log: credentials and the store URL's password are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.auth.password.is_some() {
            copy.auth.password = Some("***".to_string());
        }
        if let Ok(mut parsed) = url::Url::parse(&copy.store.url) {
            if parsed.password().is_some() && parsed.set_password(Some("***")).is_ok() {
                copy.store.url = parsed.to_string();
            }
        }
        copy
    }
}

/// Helper function to get an env variable with a default value
fn get_env_or_default<T: FromStr>(key: &str, default: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(format!("Could not parse {}: {}", key, e))),
        Err(env::VarError::NotPresent) => {
            debug!("{} not set, using default: {}", key, default);
            default.parse::<T>().map_err(|e| {
                ConfigError::ParseError(format!("Could not parse default for {}: {}", key, e))
            })
        }
        Err(e) => Err(ConfigError::EnvVarError(e)),
    }
}

/// Like [`get_env_or_default`], but unset and empty values both mean `None`.
fn get_env_optional<T: FromStr>(key: &str) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => val
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError(format!("Could not parse {}: {}", key, e))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVarError(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_str() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Testing".parse::<Environment>(), Ok(Environment::Testing));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_shortener_config_validation() {
        assert!(ShortenerConfig::default().validate().is_ok());

        let zero_length = ShortenerConfig {
            code_length: 0,
            ..Default::default()
        };
        assert!(zero_length.validate().is_err());

        let too_long = ShortenerConfig {
            code_length: 40,
            max_attempts: 10,
            ..Default::default()
        };
        assert!(matches!(too_long.validate(), Err(ConfigError::Invalid(_))));

        let exact_fit = ShortenerConfig {
            code_length: HASH_CODE_LENGTH,
            max_attempts: 1,
            ..Default::default()
        };
        assert!(exact_fit.validate().is_ok());
    }

    #[test]
    fn test_public_create_api_is_parsed_as_bool() {
        env::set_var("PUBLIC_CREATE_API", "false");
        assert!(!Config::load().unwrap().server.public_create_api);

        env::set_var("PUBLIC_CREATE_API", "true");
        assert!(Config::load().unwrap().server.public_create_api);

        env::set_var("PUBLIC_CREATE_API", "0");
        assert!(matches!(Config::load(), Err(ConfigError::ParseError(_))));

        env::remove_var("PUBLIC_CREATE_API");
        assert!(!Config::load().unwrap().server.public_create_api);
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".parse().unwrap(),
                port: 8000,
                workers: 1,
                public_base_url: None,
                public_create_api: false,
            },
            app: AppConfig {
                name: "shorty".into(),
                version: "0.1.0".into(),
                environment: Environment::Testing,
                log_level: "debug".into(),
            },
            store: StoreConfig {
                url: "redis://:hunter2@localhost:6379".into(),
                connect_timeout_seconds: 1,
                operation_timeout_ms: 100,
            },
            shortener: ShortenerConfig::default(),
            auth: AuthConfig {
                user: Some("admin".into()),
                password: Some("hunter2".into()),
            },
        };

        let printed = format!("{:?}", config.redacted());
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("admin"));
    }
}
