//! Types for authentication and user management

use serde::{Deserialize, Serialize};

use super::session::Session;

/// User data as returned by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// The user's phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// The app metadata
    #[serde(default)]
    pub app_metadata: serde_json::Value,

    /// The user metadata, carrying `first_name` / `last_name` from signup
    #[serde(default)]
    pub user_metadata: serde_json::Value,

    /// The creation time
    #[serde(default)]
    pub created_at: Option<String>,

    /// The update time
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// A string value from the user metadata, ignoring blanks
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// The part of the email before the first `@`
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
    }
}

/// Metadata attached to a new account at signup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// The signed-in user
    #[serde(default)]
    pub user: Option<User>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Signup answers with a session when the project auto-confirms emails,
/// and with the bare user when a confirmation email was sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpBody {
    Session(TokenResponse),
    User(User),
}

/// Result of a signup
#[derive(Debug, Clone)]
pub struct SignUpResult {
    /// The created user
    pub user: Option<User>,
    /// The session, when the account is usable right away
    pub session: Option<Session>,
}

impl From<SignUpBody> for SignUpResult {
    fn from(body: SignUpBody) -> Self {
        match body {
            SignUpBody::Session(tokens) => {
                let user = tokens.user.clone();
                Self {
                    user,
                    session: Some(Session::from(tokens)),
                }
            }
            SignUpBody::User(user) => Self {
                user: Some(user),
                session: None,
            },
        }
    }
}
