//! Session management for authentication

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::types::{TokenResponse, User};
use crate::error::Error;

/// Prefix marking a base64 encoded cookie value
const COOKIE_PREFIX: &str = "base64-";

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    pub expires_at: Option<i64>,

    /// The user the session belongs to
    #[serde(default)]
    pub user: Option<User>,
}

/// Claims read from an access token
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Subject, the user ID
    pub sub: String,
    /// Expiry timestamp
    pub exp: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in,
            expires_at: Some(now_secs() + expires_in),
            user: None,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => now_secs() >= expires_at,
            None => false,
        }
    }

    /// Read the claims of the access token.
    ///
    /// The signature is not checked; the identity provider does that on every
    /// call made with the token.
    pub fn claims(&self) -> Result<AccessClaims, Error> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// Encode the session as a cookie value
    pub fn to_cookie_value(&self) -> Result<String, Error> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{}{}", COOKIE_PREFIX, URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode a session from a cookie value, base64 encoded or raw JSON
    pub fn from_cookie_value(value: &str) -> Result<Self, Error> {
        let session = match value.strip_prefix(COOKIE_PREFIX) {
            Some(encoded) => {
                let json = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?;
                serde_json::from_slice(&json)?
            }
            None => serde_json::from_str(value)?,
        };
        Ok(session)
    }
}

impl From<TokenResponse> for Session {
    fn from(tokens: TokenResponse) -> Self {
        let mut session = Session::new(tokens.access_token, tokens.refresh_token, tokens.expires_in);
        session.token_type = tokens.token_type;
        session.user = tokens.user;

        if let Some(expires_at) = tokens.expires_at {
            session.expires_at = Some(expires_at);
        } else if let Ok(AccessClaims { exp: Some(exp), .. }) = session.claims() {
            session.expires_at = Some(exp);
        }

        session
    }
}
