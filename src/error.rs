//! Error handling for taskflow

use std::fmt;
use thiserror::Error;

/// Unified error type for backend calls, validation and configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Human readable message extracted from the response body
        message: String,
        /// PostgREST / Postgres error code, when the body carried one
        code: Option<String>,
    },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// An operation needed a signed-in user and there was none
    #[error("User not authenticated")]
    NotAuthenticated,

    /// Database query errors
    #[error("Database error: {0}")]
    Database(String),

    /// A required field was missing or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Session cookie decoding errors
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// HTTP status of an `Api` error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials (401/403)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Whether the backend reported a uniqueness violation (Postgres 23505)
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::Api { code: Some(code), .. } if code == "23505")
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
