//! Data access for the signed-in user
//!
//! Every call goes straight to PostgREST with the user's access token, so
//! row-level security applies on top of the `user_id` filters added here.

mod dashboard;
mod items;
mod projects;

use tracing::error;

use crate::auth::User;
use crate::error::{Error, Result};
use crate::postgrest::PostgrestClient;
use crate::Backend;

pub use dashboard::*;
pub use items::*;
pub use projects::*;

/// Data access scoped to one request
#[derive(Debug, Clone)]
pub struct Db {
    backend: Backend,
    access_token: Option<String>,
    user: Option<User>,
}

impl Db {
    pub fn new(backend: &Backend, access_token: Option<String>, user: Option<User>) -> Self {
        Self {
            backend: backend.clone(),
            access_token,
            user,
        }
    }

    /// The same backend seen with another session
    pub fn with_session(&self, access_token: Option<String>, user: Option<User>) -> Self {
        Self::new(&self.backend, access_token, user)
    }

    /// The signed-in user, if any
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The signed-in user, or `Error::NotAuthenticated`
    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(Error::NotAuthenticated)
    }

    pub(crate) fn table(&self, name: &str) -> PostgrestClient {
        self.backend
            .from(name)
            .with_auth(self.access_token.as_deref())
    }

    pub fn projects(&self) -> Projects<'_> {
        Projects::new(self)
    }

    pub fn items(&self) -> Items<'_> {
        Items::new(self)
    }

    pub fn dashboard(&self) -> Dashboard<'_> {
        Dashboard::new(self)
    }

    /// The `profiles` table, usable as a `ProfileStore`
    pub fn profiles(&self) -> PostgrestClient {
        self.table("profiles")
    }
}

/// Log a failed call with its context and pass the result on
pub(crate) fn logged<T>(context: &str, result: Result<T>) -> Result<T> {
    if let Err(ref e) = result {
        error!("Error {}: {}", context, e);
    }
    result
}
