//! Authentication against the identity provider

mod cookies;
mod session;
mod types;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use cookies::*;
pub use session::*;
pub use types::*;

/// A change to the session that the transport has to persist
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    /// A new or refreshed session
    Updated(Session),
    /// The session was signed out or found invalid
    Removed,
}

#[derive(Debug, Default)]
struct SessionSlot {
    current: Option<Session>,
    change: Option<SessionChange>,
}

/// The operations the application needs from the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password, establishing a session
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account; `metadata` ends up in the user's `user_metadata`
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpResult>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;

    /// The user behind the current session, `None` when signed out
    async fn get_user(&self) -> Result<Option<User>>;

    /// Access token of the current session
    fn access_token(&self) -> Option<String>;
}

/// Request-scoped client for the identity provider
///
/// Holds at most one session, usually read from the request's cookies, and
/// remembers whether it changed so the response can rewrite them.
pub struct Auth {
    /// The base URL for the backend
    url: String,

    /// The anonymous API key
    key: String,

    /// HTTP client used for requests
    client: Client,

    slot: Mutex<SessionSlot>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(
        url: &str,
        key: &str,
        client: Client,
        options: ClientOptions,
        session: Option<Session>,
    ) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            slot: Mutex::new(SessionSlot {
                current: session,
                change: None,
            }),
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn slot(&self) -> MutexGuard<'_, SessionSlot> {
        // A poisoned slot still holds a usable session value.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.slot().current.clone()
    }

    /// Replace the session
    pub fn set_session(&self, session: Session) {
        let mut slot = self.slot();
        if self.options.persist_session {
            slot.change = Some(SessionChange::Updated(session.clone()));
        }
        slot.current = Some(session);
    }

    /// Forget the session
    pub fn clear_session(&self) {
        let mut slot = self.slot();
        if slot.current.take().is_some() || slot.change.is_some() {
            slot.change = Some(SessionChange::Removed);
        }
    }

    /// Take the pending session change, if any
    pub fn take_session_change(&self) -> Option<SessionChange> {
        self.slot().change.take()
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.get_auth_url("/token?grant_type=password");

        let tokens = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&json!({ "email": email, "password": password }))?
            .execute::<TokenResponse>()
            .await?;

        let session = Session::from(tokens);
        self.set_session(session.clone());
        info!("Signed in {}", email);

        Ok(session)
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpResult> {
        let url = self.get_auth_url("/signup");

        let body = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&json!({ "email": email, "password": password, "data": metadata }))?
            .execute::<SignUpBody>()
            .await?;

        let result = SignUpResult::from(body);
        if let Some(ref session) = result.session {
            self.set_session(session.clone());
        }
        info!("Created account for {}", email);

        Ok(result)
    }

    /// Sign out the current user
    ///
    /// The local session is dropped even when the provider call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let token = match self.get_session() {
            Some(session) => session.access_token,
            None => return Ok(()),
        };
        self.clear_session();

        let url = self.get_auth_url("/logout");
        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(&token)
            .execute_empty()
            .await
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .get_session()
            .map(|s| s.refresh_token)
            .ok_or_else(|| Error::auth("Not logged in"))?;

        let url = self.get_auth_url("/token?grant_type=refresh_token");
        let tokens = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&json!({ "refresh_token": refresh_token }))?
            .execute::<TokenResponse>()
            .await?;

        let session = Session::from(tokens);
        self.set_session(session.clone());
        debug!("Refreshed session");

        Ok(session)
    }

    /// Get the user behind the current session
    ///
    /// An expired access token is refreshed first when `auto_refresh_token`
    /// is set. Credentials the provider rejects clear the session and yield
    /// `Ok(None)`; anything else is returned as an error.
    pub async fn get_user(&self) -> Result<Option<User>> {
        let mut session = match self.get_session() {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            if !self.options.auto_refresh_token {
                self.clear_session();
                return Ok(None);
            }
            session = match self.refresh_session().await {
                Ok(session) => session,
                Err(e) if e.is_unauthorized() || e.status() == Some(400) => {
                    warn!("Refresh token rejected: {}", e);
                    self.clear_session();
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
        }

        let url = self.get_auth_url("/user");
        let result = Fetch::get(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(&session.access_token)
            .execute::<User>()
            .await;

        match result {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => {
                debug!("Access token rejected: {}", e);
                self.clear_session();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl IdentityProvider for Auth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        Auth::sign_in_with_password(self, email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpResult> {
        Auth::sign_up(self, email, password, metadata).await
    }

    async fn sign_out(&self) -> Result<()> {
        Auth::sign_out(self).await
    }

    async fn get_user(&self) -> Result<Option<User>> {
        Auth::get_user(self).await
    }

    fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server: &MockServer, session: Option<Session>) -> Auth {
        Auth::new(
            &server.uri(),
            "test_key",
            Client::new(),
            ClientOptions::default(),
            session,
        )
    }

    fn token_body(access_token: &str) -> serde_json::Value {
        json!({
            "access_token": access_token,
            "refresh_token": "test_refresh_token",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "test_user_id",
                "email": "test@example.com",
                "app_metadata": {},
                "user_metadata": {},
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn test_sign_in_stores_session() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/token"))
                .and(query_param("grant_type", "password"))
                .and(header("apikey", "test_key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(token_body("test_access_token")))
                .expect(1)
                .mount(&mock_server)
                .await;

            let auth = auth(&mock_server, None);
            let session = auth
                .sign_in_with_password("test@example.com", "password123")
                .await
                .unwrap();

            assert_eq!(session.access_token, "test_access_token");
            assert_eq!(auth.get_session(), Some(session.clone()));
            assert_eq!(
                auth.take_session_change(),
                Some(SessionChange::Updated(session))
            );
            assert_eq!(auth.take_session_change(), None);
        });
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&mock_server)
            .await;

        let auth = auth(&mock_server, None);
        let err = auth
            .sign_in_with_password("test@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(auth.get_session().is_none());
        assert!(auth.take_session_change().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_sends_metadata() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({
                "email": "a@x.com",
                "data": {"first_name": "Jane", "last_name": "Doe"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "new-user",
                "email": "a@x.com",
                "user_metadata": {"first_name": "Jane", "last_name": "Doe"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = auth(&mock_server, None);
        let metadata = SignUpMetadata {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
        };
        let result = auth.sign_up("a@x.com", "secret", &metadata).await.unwrap();

        assert_eq!(result.user.unwrap().id, "new-user");
        assert!(result.session.is_none());
        assert!(auth.get_session().is_none());
    }

    #[tokio::test]
    async fn test_get_user_without_session() {
        let mock_server = MockServer::start().await;
        let auth = auth(&mock_server, None);
        assert_eq!(auth.get_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_user_with_valid_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("Authorization", "Bearer good_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-1",
                "email": "a@x.com"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = auth(
            &mock_server,
            Some(Session::new("good_token".into(), "rt".into(), 3600)),
        );
        let user = auth.get_user().await.unwrap().unwrap();
        assert_eq!(user.id, "user-1");
        assert!(auth.take_session_change().is_none());
    }

    #[tokio::test]
    async fn test_get_user_rejected_token_clears_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})),
            )
            .mount(&mock_server)
            .await;

        let auth = auth(
            &mock_server,
            Some(Session::new("stale".into(), "rt".into(), 3600)),
        );
        assert_eq!(auth.get_user().await.unwrap(), None);
        assert_eq!(auth.take_session_change(), Some(SessionChange::Removed));
    }

    #[tokio::test]
    async fn test_get_user_refreshes_expired_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_partial_json(json!({"refresh_token": "old_refresh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh_token")))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("Authorization", "Bearer fresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "test_user_id"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut expired = Session::new("old_token".into(), "old_refresh".into(), 3600);
        expired.expires_at = Some(0);
        let auth = auth(&mock_server, Some(expired));

        let user = auth.get_user().await.unwrap().unwrap();
        assert_eq!(user.id, "test_user_id");
        match auth.take_session_change() {
            Some(SessionChange::Updated(session)) => assert_eq!(session.access_token, "fresh_token"),
            other => panic!("Expected refreshed session, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_user_surfaces_outage() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let auth = auth(
            &mock_server,
            Some(Session::new("token".into(), "rt".into(), 3600)),
        );
        let err = auth.get_user().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(auth.get_session().is_some());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_first() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("Authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = auth(
            &mock_server,
            Some(Session::new("token".into(), "rt".into(), 3600)),
        );
        assert!(auth.sign_out().await.is_err());
        assert!(auth.get_session().is_none());
        assert_eq!(auth.take_session_change(), Some(SessionChange::Removed));
    }
}
