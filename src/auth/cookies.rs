//! Request-scoped credential storage backed by cookies
//!
//! Large sessions are split across `name.0`, `name.1`, ... the same way the
//! JavaScript SSR helpers do, so cookies written by either side stay readable.

use tracing::debug;

use super::session::Session;
use super::SessionChange;

/// Browsers reject cookies much over 4 KiB; leave room for the attributes.
const MAX_CHUNK_SIZE: usize = 3180;

/// Lifetime of the session cookie, 400 days.
///
/// The cookie carries the refresh token, so it has to outlive the access
/// token it wraps.
pub const SESSION_COOKIE_MAX_AGE: i64 = 400 * 24 * 60 * 60;

/// Cookies sent with one request
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse one or more `Cookie` header values
    pub fn parse<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cookies = headers
            .into_iter()
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().trim_matches('"').to_string()))
            })
            .collect();

        Self { cookies }
    }

    /// Value of a cookie
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn chunk_names(&self, name: &str) -> Vec<String> {
        let prefix = format!("{}.", name);
        self.cookies
            .iter()
            .filter(|(n, _)| {
                n.strip_prefix(&prefix)
                    .is_some_and(|idx| idx.parse::<usize>().is_ok())
            })
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Reassemble the raw session cookie value, chunked or not
    fn session_value(&self, name: &str) -> Option<String> {
        if let Some(value) = self.get(name) {
            return Some(value.to_string());
        }

        let mut value = String::new();
        for idx in 0.. {
            match self.get(&format!("{}.{}", name, idx)) {
                Some(chunk) => value.push_str(chunk),
                None => break,
            }
        }
        (!value.is_empty()).then_some(value)
    }

    /// The session stored under `name`, if any decodes
    pub fn session(&self, name: &str) -> Option<Session> {
        let value = self.session_value(name)?;
        match Session::from_cookie_value(&value) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("Ignoring undecodable session cookie {}: {}", name, e);
                None
            }
        }
    }

    /// `Set-Cookie` values that persist a session change
    pub fn session_cookies(
        &self,
        name: &str,
        change: &SessionChange,
        secure: bool,
    ) -> Vec<String> {
        let mut stale: Vec<String> = self.chunk_names(name);
        if self.get(name).is_some() {
            stale.push(name.to_string());
        }

        let mut out = Vec::new();
        if let SessionChange::Updated(session) = change {
            let value = match session.to_cookie_value() {
                Ok(value) => value,
                Err(e) => {
                    debug!("Could not encode session cookie: {}", e);
                    return out;
                }
            };
            let max_age = SESSION_COOKIE_MAX_AGE;

            if value.len() <= MAX_CHUNK_SIZE {
                out.push(set_cookie(name, &value, max_age, secure));
                stale.retain(|n| n != name);
            } else {
                let chunks: Vec<&str> = value
                    .as_bytes()
                    .chunks(MAX_CHUNK_SIZE)
                    .filter_map(|c| std::str::from_utf8(c).ok())
                    .collect();
                for (idx, chunk) in chunks.iter().enumerate() {
                    let chunk_name = format!("{}.{}", name, idx);
                    out.push(set_cookie(&chunk_name, chunk, max_age, secure));
                    stale.retain(|n| n != &chunk_name);
                }
            }
        }

        out.extend(stale.iter().map(|n| set_cookie(n, "", 0, secure)));
        out
    }
}

fn set_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("access".into(), "refresh".into(), 3600)
    }

    #[test]
    fn parses_multiple_headers() {
        let jar = CookieJar::parse(["a=1; b = 2", "c=\"3\"", "broken"]);
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("2"));
        assert_eq!(jar.get("c"), Some("3"));
        assert_eq!(jar.get("broken"), None);
    }

    #[test]
    fn reads_plain_session_cookie() {
        let value = session().to_cookie_value().unwrap();
        let header = format!("theme=dark; sb-auth-token={}", value);
        let jar = CookieJar::parse([header.as_str()]);
        assert_eq!(jar.session("sb-auth-token"), Some(session()));
        assert_eq!(jar.session("other"), None);
    }

    #[test]
    fn reads_chunked_session_cookie() {
        let value = session().to_cookie_value().unwrap();
        let (first, second) = value.split_at(value.len() / 2);
        let header = format!("sb-auth-token.1={}; sb-auth-token.0={}", second, first);
        let jar = CookieJar::parse([header.as_str()]);
        assert_eq!(jar.session("sb-auth-token"), Some(session()));
    }

    #[test]
    fn bad_cookie_is_no_session() {
        let jar = CookieJar::parse(["sb-auth-token=base64-!!!"]);
        assert_eq!(jar.session("sb-auth-token"), None);
    }

    #[test]
    fn writes_updated_session() {
        let jar = CookieJar::default();
        let cookies = jar.session_cookies(
            "sb-auth-token",
            &SessionChange::Updated(session()),
            true,
        );
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("sb-auth-token=base64-"));
        assert!(cookies[0].ends_with("; Secure"));
    }

    #[test]
    fn session_cookie_outlives_access_token() {
        let session = session();
        let cookies = CookieJar::default().session_cookies(
            "sb-auth-token",
            &SessionChange::Updated(session.clone()),
            false,
        );

        let max_age: i64 = cookies[0]
            .split("; ")
            .find_map(|attr| attr.strip_prefix("Max-Age="))
            .and_then(|v| v.parse().ok())
            .unwrap();
        assert_eq!(max_age, SESSION_COOKIE_MAX_AGE);
        assert!(max_age > session.expires_in);
    }

    #[test]
    fn large_session_is_chunked_and_replaces_plain_cookie() {
        let mut big = session();
        big.access_token = "x".repeat(5000);
        let jar = CookieJar::parse(["sb-auth-token=old"]);
        let cookies = jar.session_cookies("sb-auth-token", &SessionChange::Updated(big), false);

        assert!(cookies[0].starts_with("sb-auth-token.0="));
        assert!(cookies.iter().any(|c| c.starts_with("sb-auth-token.1=")));
        assert!(cookies
            .iter()
            .any(|c| c.starts_with("sb-auth-token=;") && c.contains("Max-Age=0")));
    }

    #[test]
    fn removal_expires_every_chunk() {
        let jar = CookieJar::parse(["sb-auth-token.0=a; sb-auth-token.1=b; unrelated=1"]);
        let cookies = jar.session_cookies("sb-auth-token", &SessionChange::Removed, false);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert!(!cookies.iter().any(|c| c.starts_with("unrelated")));
    }
}
