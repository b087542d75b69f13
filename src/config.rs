//! Configuration for the backend client and the web server

use std::net::SocketAddr;
use std::time::Duration;

use tracing::Level;
use url::Url;

use crate::error::{Error, Result};

/// Configuration options for the backend client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether an expired access token is refreshed while resolving the user
    pub auto_refresh_token: bool,

    /// Whether sessions are written back to the session cookie
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// Name of the session cookie
    pub cookie_name: String,

    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            cookie_name: "sb-auth-token".to_string(),
            cookie_secure: true,
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the session cookie name
    pub fn with_cookie_name(mut self, value: &str) -> Self {
        self.cookie_name = value.to_string();
        self
    }

    /// Set whether the session cookie is marked `Secure`
    pub fn with_cookie_secure(mut self, value: bool) -> Self {
        self.cookie_secure = value;
        self
    }
}

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Supabase project
    pub backend_url: Url,
    /// Anonymous API key of the Supabase project
    pub anon_key: String,
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub client: ClientOptions,
}

impl AppConfig {
    /// Build a configuration, validating the backend URL and key.
    pub fn new(backend_url: &str, anon_key: &str) -> Result<Self> {
        let backend_url = Url::parse(backend_url)?;
        if anon_key.trim().is_empty() {
            return Err(Error::config("SUPABASE_ANON_KEY cannot be empty"));
        }

        Ok(Self {
            backend_url,
            anon_key: anon_key.to_string(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            client: ClientOptions::default(),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first, except in tests.
    /// `SUPABASE_URL` and `SUPABASE_ANON_KEY` are required.
    pub fn from_env() -> Result<Self> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL")
            .ok_or_else(|| Error::config("missing environment variable SUPABASE_URL"))?;
        let key = lookup("SUPABASE_ANON_KEY")
            .ok_or_else(|| Error::config("missing environment variable SUPABASE_ANON_KEY"))?;
        let mut config = Self::new(&url, &key)
            .map_err(|e| Error::config(format!("invalid backend configuration: {}", e)))?;

        if let Some(addr) = lookup("BIND_ADDRESS") {
            config.bind_address = addr.parse().map_err(|e| {
                Error::config(format!("invalid value for BIND_ADDRESS: {}", e))
            })?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level.parse().map_err(|_| {
                Error::config(format!("'{}' is not a valid log level", level))
            })?;
        }

        if let Some(name) = lookup("AUTH_COOKIE_NAME") {
            config.client = config.client.with_cookie_name(&name);
        }

        if let Some(secure) = lookup("AUTH_COOKIE_SECURE") {
            let secure = secure.parse::<bool>().map_err(|_| {
                Error::config(format!("invalid value for AUTH_COOKIE_SECURE: {}", secure))
            })?;
            config.client = config.client.with_cookie_secure(secure);
        }

        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                Error::config(format!("invalid value for REQUEST_TIMEOUT_SECS: {}", secs))
            })?;
            let timeout = (secs > 0).then(|| Duration::from_secs(secs));
            config.client = config.client.with_request_timeout(timeout);
        }

        Ok(config)
    }
}
