use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.bitcoin.de";
pub const DEFAULT_VERSION: &str = "v2";
pub const DEFAULT_USER_AGENT: &str = "Bitcoin.de Rust API Client";
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone)]
pub struct BitcoindeConfig {
    pub api_key: Secret<String>,
    pub api_secret: Secret<String>,
    pub base_url: String,
    pub version: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for BitcoindeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BitcoindeConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("api_secret", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("user_agent", &self.user_agent)?;
        state.serialize_field("timeout_ms", &self.timeout_ms)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for BitcoindeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BitcoindeConfigHelper {
            api_key: String,
            api_secret: String,
            base_url: Option<String>,
            version: Option<String>,
            user_agent: Option<String>,
            timeout_ms: Option<u64>,
        }

        let helper = BitcoindeConfigHelper::deserialize(deserializer)?;
        let mut config = Self::new(helper.api_key, helper.api_secret);
        if let Some(base_url) = helper.base_url {
            config.base_url = base_url;
        }
        if let Some(version) = helper.version {
            config.version = version;
        }
        if let Some(user_agent) = helper.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(timeout_ms) = helper.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

impl BitcoindeConfig {
    /// Create a new configuration with API credentials and default endpoint settings
    #[must_use]
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            api_secret: Secret::new(api_secret),
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `BITCOINDE_API_KEY`)
    /// - `{PREFIX}_API_SECRET` (e.g., `BITCOINDE_API_SECRET`)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_VERSION` (optional)
    /// - `{PREFIX}_USER_AGENT` (optional)
    /// - `{PREFIX}_TIMEOUT_MS` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let api_secret_var = format!("{}_API_SECRET", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let api_secret = env::var(&api_secret_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_secret_var))?;

        let mut config = Self::new(api_key, api_secret);

        if let Ok(base_url) = env::var(format!("{}_BASE_URL", prefix)) {
            config.base_url = base_url;
        }
        if let Ok(version) = env::var(format!("{}_VERSION", prefix)) {
            config.version = version;
        }
        if let Ok(user_agent) = env::var(format!("{}_USER_AGENT", prefix)) {
            config.user_agent = user_agent;
        }

        let timeout_var = format!("{}_TIMEOUT_MS", prefix);
        if let Ok(raw) = env::var(&timeout_var) {
            config.timeout_ms = raw.trim().parse().map_err(|e| {
                ConfigError::InvalidConfiguration(format!(
                    "{} must be a number of milliseconds, got '{}': {}",
                    timeout_var, raw, e
                ))
            })?;
        }

        Ok(config)
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    ///
    /// A missing file is not an error; the process environment is used as-is.
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Check that both credentials are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ConfigError::MissingCredential("key"));
        }
        if self.api_secret.expose_secret().is_empty() {
            return Err(ConfigError::MissingCredential("secret"));
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Set custom base URL
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version path segment
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get API secret (use carefully - exposes secret)
    pub fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    /// `{base_url}/{version}` without a trailing slash
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.version.trim_matches('/')
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required settings \"{0}\" is missing")]
    MissingCredential(&'static str),

    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
