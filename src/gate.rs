//! Authentication policy evaluated at the entry of every request

use tracing::debug;

/// What to do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Let the request through
    Pass,
    /// Send the client elsewhere
    Redirect(String),
}

/// Which requests a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    Anonymous,
}

impl AuthState {
    pub fn from_user<T>(user: Option<&T>) -> Self {
        if user.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }
}

/// One policy entry: paths plus an auth state map to a redirect target
#[derive(Debug, Clone)]
pub struct GateRule {
    prefixes: Vec<String>,
    state: AuthState,
    redirect_to: String,
}

impl GateRule {
    pub fn new(prefixes: &[&str], state: AuthState, redirect_to: &str) -> Self {
        Self {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            state,
            redirect_to: redirect_to.to_string(),
        }
    }

    fn matches(&self, path: &str, state: AuthState) -> bool {
        self.state == state && self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

const EXCLUDED_PREFIXES: &[&str] = &["/static/", "/_next/static", "/_next/image", "/favicon.ico"];

const EXCLUDED_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// The route gate: a policy table consulted in order, first match wins
#[derive(Debug, Clone)]
pub struct RouteGate {
    rules: Vec<GateRule>,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::new(vec![
            GateRule::new(&["/login", "/signup"], AuthState::Authenticated, "/dashboard"),
            GateRule::new(&["/dashboard", "/projects"], AuthState::Anonymous, "/login"),
        ])
    }
}

impl RouteGate {
    pub fn new(rules: Vec<GateRule>) -> Self {
        Self { rules }
    }

    /// Whether the gate looks at this path at all
    ///
    /// Static assets skip the gate and never trigger a session lookup.
    pub fn applies_to(&self, path: &str) -> bool {
        if EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return false;
        }
        let lower = path.to_ascii_lowercase();
        !EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Decide what happens to a request for `path`
    pub fn evaluate(&self, path: &str, state: AuthState) -> GateAction {
        let action = self
            .rules
            .iter()
            .find(|rule| rule.matches(path, state))
            .map(|rule| GateAction::Redirect(rule.redirect_to.clone()))
            .unwrap_or(GateAction::Pass);

        debug!("Gate {:?} {} -> {:?}", state, path, action);
        action
    }
}
