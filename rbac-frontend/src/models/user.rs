use super::VisitorSession;
use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use rbac_core::Session;

/// The signed-in user behind a request.
///
/// Guarded routes are checked by the route guard first; extracting this on
/// an unguarded route still redirects anonymous visitors to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
    pub access_token: String,
}

impl CurrentUser {
    pub fn roles(&self) -> &[String] {
        &self.session.roles
    }

    /// Email from the token, falling back to the user id.
    pub fn display_name(&self) -> String {
        self.session
            .email()
            .or_else(|| self.session.user_id())
            .unwrap_or_else(|| "User".to_string())
    }

    pub fn is_admin(&self) -> bool {
        self.session.has_any_role(&["Admin"])
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let session = match parts.extensions.get::<VisitorSession>() {
            Some(visitor) => visitor.current().await,
            None => Session::anonymous(),
        };

        match session.token.clone() {
            Some(access_token) if session.authenticated => Ok(CurrentUser {
                session,
                access_token,
            }),
            _ => {
                let requested = parts.uri.path();
                Err(Redirect::to(&app.guard.login_redirect(requested)).into_response())
            }
        }
    }
}
