//! Taskflow
//!
//! A task and document manager for solo developers. Users sign up, create
//! projects and keep tasks and documents in them. Accounts, storage and
//! row-level authorization live in a Supabase project; this crate is the
//! web application in front of it.

pub mod actions;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod models;
pub mod postgrest;
pub mod profile;
pub mod store;
pub mod web;

use reqwest::Client;

use crate::auth::{Auth, Session};
use crate::config::{AppConfig, ClientOptions};
use crate::postgrest::PostgrestClient;

pub use crate::error::{Error, Result};

/// Connection to the backend project
#[derive(Debug, Clone)]
pub struct Backend {
    /// The base URL for the project, without a trailing slash
    url: String,
    /// The anonymous API key for the project
    key: String,
    /// HTTP client shared by every request
    http_client: Client,
    /// Client options
    options: ClientOptions,
}

impl Backend {
    /// Create a new backend connection
    ///
    /// # Example
    ///
    /// ```
    /// use taskflow::Backend;
    ///
    /// let backend = Backend::new("https://your-project-url.supabase.co", "your-anon-key");
    /// assert_eq!(backend.url(), "https://your-project-url.supabase.co");
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new backend connection with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use taskflow::{Backend, config::ClientOptions};
    ///
    /// let options = ClientOptions::default()
    ///     .with_auto_refresh_token(true)
    ///     .with_request_timeout(Some(Duration::from_secs(10)));
    /// let backend = Backend::new_with_options(
    ///     "https://your-project-url.supabase.co",
    ///     "your-anon-key",
    ///     options,
    /// );
    /// ```
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_else(|_| Client::new());

        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
        }
    }

    /// Create the backend connection described by the app configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new_with_options(
            config.backend_url.as_str(),
            &config.anon_key,
            config.client.clone(),
        )
    }

    /// An auth client with no session
    pub fn auth(&self) -> Auth {
        self.auth_with_session(None)
    }

    /// An auth client for one request, starting from the session it carried
    pub fn auth_with_session(&self, session: Option<Session>) -> Auth {
        Auth::new(
            &self.url,
            &self.key,
            self.http_client.clone(),
            self.options.clone(),
            session,
        )
    }

    /// Create a new PostgrestClient for a table or view
    ///
    /// # Example
    ///
    /// ```
    /// use taskflow::Backend;
    ///
    /// let backend = Backend::new("https://your-project-url.supabase.co", "your-anon-key");
    /// let projects = backend.from("projects");
    /// assert_eq!(projects.table(), "projects");
    /// ```
    pub fn from(&self, table: &str) -> PostgrestClient {
        PostgrestClient::new(
            &self.url,
            &self.key,
            table,
            self.http_client.clone(),
            &self.options.db_schema,
        )
    }

    /// Client options
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The base URL of the project
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::actions::ActionOutcome;
    pub use crate::api::Db;
    pub use crate::auth::{Auth, IdentityProvider, Session, User};
    pub use crate::config::{AppConfig, ClientOptions};
    pub use crate::error::{Error, Result};
    pub use crate::models::{Item, ItemType, Profile, Project, TaskStatus};
    pub use crate::profile::{ProfileProvisioner, Provisioning};
    pub use crate::Backend;
}
