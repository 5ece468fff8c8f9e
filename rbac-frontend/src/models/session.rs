use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use rbac_core::SessionStore;
use std::ops::Deref;
use std::sync::Arc;

/// The session of the browser behind a request.
///
/// Installed by the visitor session middleware; every visitor gets a
/// store of their own, hydrated from their cookie session.
#[derive(Clone)]
pub struct VisitorSession(pub Arc<SessionStore>);

impl Deref for VisitorSession {
    type Target = SessionStore;

    fn deref(&self) -> &SessionStore {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for VisitorSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VisitorSession>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Visitor session middleware is not installed",
            ))
    }
}
