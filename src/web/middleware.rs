//! Route gate middleware

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::CookieJar;
use crate::gate::{AuthState, GateAction};
use crate::web::state::{AppState, RequestContext};

/// Resolves the session from the cookies, applies the gate policy and
/// writes any session change back as `Set-Cookie` headers.
///
/// A session that cannot be resolved counts as signed out.
pub async fn route_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if !state.gate.applies_to(&path) {
        let auth = Arc::new(state.backend.auth());
        req.extensions_mut().insert(RequestContext { auth, user: None });
        return next.run(req).await;
    }

    // 1. Read the session cookie
    let jar = CookieJar::parse(
        req.headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );
    let client = &state.config.client;
    let auth = Arc::new(
        state
            .backend
            .auth_with_session(jar.session(&client.cookie_name)),
    );

    // 2. Resolve the user, refreshing an expired token
    let user = match auth.get_user().await {
        Ok(user) => user,
        Err(e) => {
            warn!("Could not resolve session for {}: {}", path, e);
            None
        }
    };

    // 3. Apply the policy
    let mut response = match state.gate.evaluate(&path, AuthState::from_user(user.as_ref())) {
        GateAction::Redirect(to) => Redirect::temporary(&to).into_response(),
        GateAction::Pass => {
            req.extensions_mut().insert(RequestContext {
                auth: auth.clone(),
                user,
            });
            next.run(req).await
        }
    };

    // 4. Persist whatever happened to the session
    if let Some(change) = auth.take_session_change() {
        debug!("Writing session cookies for {}", path);
        for cookie in jar.session_cookies(&client.cookie_name, &change, client.cookie_secure) {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }

    response
}
