use serde::Deserialize;

use std::{fmt, net::SocketAddr};

const fn default_app_port() -> u16 {
    3000
}

const fn default_db_port() -> u16 {
    5432
}

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Database host
    pub host: String,
    /// Database user
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: Option<String>,
    /// Database name
    pub database: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    /// HTTP listen port
    #[serde(default = "default_app_port")]
    pub app_port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
}

impl Config {
    /// Parses configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(self.host.as_str())
            .port(self.db_port)
            .user(self.user.as_str())
            .dbname(self.database.as_str());

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            pg.password(password);
        }

        pg
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.app_port))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("db_port", &self.db_port)
            .field("app_port", &self.app_port)
            .finish()
    }
}

/// Reads the configuration from the process environment, after loading a
/// `.env` file from the working directory if there is one.
pub fn load_config() -> Result<Config, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment overrides from {}", path.display()),
        Err(e) if e.not_found() => {
            tracing::debug!("No .env file found, using process environment only");
        }
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }

    Config::from_vars(std::env::vars())
}
