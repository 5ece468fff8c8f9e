//! The process-wide session: one bearer token, persisted across restarts,
//! from which roles and the authenticated flag are derived.

use crate::api::{
    ApiClient, LoginRequest, RegisterRequest, TokenResponse, LOGIN_PATH, REGISTER_PATH,
};
use crate::error::SessionError;
use crate::storage::KeyValueStore;
use crate::token;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable key holding the raw token string.
pub const TOKEN_KEY: &str = "rbac_token";

/// Snapshot of the session at one point in time.
///
/// Built only from a token, so roles can never drift from the token they
/// were derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub roles: Vec<String>,
    pub authenticated: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn from_token(raw: &str) -> Self {
        Self {
            token: Some(raw.to_string()),
            roles: token::roles_of(raw),
            authenticated: true,
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.token.as_deref().and_then(token::user_id_of)
    }

    pub fn email(&self) -> Option<String> {
        self.token.as_deref().and_then(token::email_of)
    }

    /// True if any of `required` is among the session's roles.
    pub fn has_any_role<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .any(|role| self.roles.iter().any(|mine| mine == role.as_ref()))
    }
}

/// Single authoritative holder of the current token.
///
/// Hydrated from durable storage on construction. Every read re-checks
/// expiry and clears a stale token the same way [`SessionStore::logout`]
/// does, so `authenticated` always means "token present and not expired".
pub struct SessionStore {
    api: Arc<ApiClient>,
    storage: Arc<dyn KeyValueStore>,
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn hydrate(api: Arc<ApiClient>, storage: Arc<dyn KeyValueStore>) -> Self {
        let persisted = match storage.get(TOKEN_KEY) {
            Ok(value) => value.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session token");
                None
            }
        };

        let restored = match persisted {
            Some(t) if token::is_expired(&t) => {
                tracing::info!("Persisted session token has expired, clearing it");
                remove_persisted(storage.as_ref());
                None
            }
            other => other,
        };

        if restored.is_some() {
            tracing::debug!("Restored session from durable storage");
        }

        Self {
            api,
            storage,
            token: RwLock::new(restored),
        }
    }

    /// Current session, healing an expired token first.
    pub async fn current(&self) -> Session {
        {
            let slot = self.token.read().await;
            match slot.as_deref() {
                None => return Session::anonymous(),
                Some(t) if !token::is_expired(t) => return Session::from_token(t),
                Some(_) => {}
            }
        }

        let mut slot = self.token.write().await;
        match slot.as_deref() {
            Some(t) if token::is_expired(t) => {
                tracing::info!("Session token expired, signing out");
                remove_persisted(self.storage.as_ref());
                *slot = None;
                Session::anonymous()
            }
            Some(t) => Session::from_token(t),
            None => Session::anonymous(),
        }
    }

    /// The bearer token, if the session is authenticated.
    pub async fn token(&self) -> Option<String> {
        self.current().await.token
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current().await.authenticated
    }

    /// Exchange credentials for a token and adopt it.
    ///
    /// A remote failure is returned unchanged and leaves the session as it was.
    pub async fn login(
        &self,
        email: &str,
        password: &Secret<String>,
    ) -> Result<String, SessionError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: TokenResponse = self.api.post(LOGIN_PATH, Some(&body), None).await?;

        self.adopt(response.access_token).await
    }

    /// Create an account and adopt the token issued for it.
    pub async fn register(
        &self,
        email: &str,
        password: &Secret<String>,
        first_name: &str,
        last_name: &str,
    ) -> Result<String, SessionError> {
        let body = RegisterRequest {
            email,
            password: password.expose_secret(),
            first_name,
            last_name,
        };
        let response: TokenResponse = self.api.post(REGISTER_PATH, Some(&body), None).await?;

        self.adopt(response.access_token).await
    }

    /// Forget the token locally. Never fails and makes no network call.
    pub async fn logout(&self) {
        let mut slot = self.token.write().await;
        remove_persisted(self.storage.as_ref());
        *slot = None;
        tracing::info!("Signed out");
    }

    async fn adopt(&self, new_token: String) -> Result<String, SessionError> {
        let mut slot = self.token.write().await;

        if token::is_expired(&new_token) {
            // Issued already stale: behave as if it was adopted and then healed.
            tracing::warn!("Received an already expired token, session cleared");
            remove_persisted(self.storage.as_ref());
            *slot = None;
            return Ok(new_token);
        }

        self.storage.set(TOKEN_KEY, &new_token)?;
        *slot = Some(new_token.clone());

        let user_id = token::user_id_of(&new_token);
        tracing::info!(
            user_id = user_id.as_deref().unwrap_or("-"),
            "Session established"
        );
        Ok(new_token)
    }
}

fn remove_persisted(storage: &dyn KeyValueStore) {
    if let Err(e) = storage.remove(TOKEN_KEY) {
        tracing::warn!(error = %e, "Failed to remove persisted session token");
    }
}
