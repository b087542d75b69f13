//! Shared application state and the per-request context

use std::sync::Arc;

use crate::api::Db;
use crate::auth::{Auth, IdentityProvider, User};
use crate::config::AppConfig;
use crate::gate::RouteGate;
use crate::Backend;

/// State shared by every request, created once at startup
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub config: Arc<AppConfig>,
    pub gate: Arc<RouteGate>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_gate(config, RouteGate::default())
    }

    pub fn with_gate(config: AppConfig, gate: RouteGate) -> Self {
        Self {
            backend: Backend::from_config(&config),
            config: Arc::new(config),
            gate: Arc::new(gate),
        }
    }
}

/// What the route gate learned about the request
///
/// Inserted into the request extensions for every request that reaches a
/// handler.
#[derive(Clone)]
pub struct RequestContext {
    pub auth: Arc<Auth>,
    pub user: Option<User>,
}

impl RequestContext {
    /// Data access with this request's credentials
    pub fn db(&self, backend: &Backend) -> Db {
        Db::new(backend, self.auth.access_token(), self.user.clone())
    }
}
