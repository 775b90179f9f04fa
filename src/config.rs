use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "app.db";
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TEMPLATES: &str = "templates/**/*";
/// `actix_web::cookie::Key::from` panics on shorter keys.
const MIN_SECRET_LEN: usize = 64;

/// Errors raised while reading the server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got `{0}`")]
    InvalidPort(String),
    #[error("SECRET_KEY must be at least 64 bytes long")]
    SecretTooShort,
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Signing secret for flash cookies; a random key is generated when absent.
    pub secret: Option<String>,
    pub templates: String,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let secret = non_empty("SECRET_KEY");
        if secret
            .as_ref()
            .is_some_and(|value| value.len() < MIN_SECRET_LEN)
        {
            return Err(ConfigError::SecretTooShort);
        }

        Ok(Self {
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            address: non_empty("ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.into()),
            port,
            secret,
            templates: non_empty("TEMPLATES").unwrap_or_else(|| DEFAULT_TEMPLATES.into()),
        })
    }
}
