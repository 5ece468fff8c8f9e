//! Navigation-time access decisions.
//!
//! The guard is a pure function of a [`Session`] snapshot and the roles a
//! destination requires. Callers evaluate it on every navigation; nothing
//! is cached here.

use crate::session::Session;
use serde::Deserialize;

/// Outcome of evaluating a session against a destination's requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Unauthenticated,
    /// Authenticated, but holding none of the required roles.
    Unauthorized,
    Authorized,
}

/// What the page layer should do for a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render,
    Redirect(String),
}

/// Any-of role check. An empty `required` list admits every
/// authenticated session.
pub fn evaluate<S: AsRef<str>>(session: &Session, required: &[S]) -> Access {
    if !session.authenticated {
        Access::Unauthenticated
    } else if !required.is_empty() && !session.has_any_role(required) {
        Access::Unauthorized
    } else {
        Access::Authorized
    }
}

/// Redirect destinations for failed checks.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteGuard {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_not_authorized_path")]
    pub not_authorized_path: String,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_not_authorized_path() -> String {
    "/not-authorized".to_string()
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            not_authorized_path: default_not_authorized_path(),
        }
    }
}

impl RouteGuard {
    /// Decide a navigation to `requested_path`.
    ///
    /// Unauthenticated visitors go to the login page with the requested
    /// path preserved in `next`.
    pub fn decide<S: AsRef<str>>(
        &self,
        session: &Session,
        required: &[S],
        requested_path: &str,
    ) -> Decision {
        match evaluate(session, required) {
            Access::Authorized => Decision::Render,
            Access::Unauthenticated => Decision::Redirect(self.login_redirect(requested_path)),
            Access::Unauthorized => Decision::Redirect(self.not_authorized_path.clone()),
        }
    }

    pub fn login_redirect(&self, requested_path: &str) -> String {
        format!(
            "{}?next={}",
            self.login_path,
            urlencoding::encode(safe_next(Some(requested_path)))
        )
    }
}

/// Post-login destination, restricted to local absolute paths.
///
/// Anything else (missing, scheme-relative `//host`, absolute URLs) falls
/// back to `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}
