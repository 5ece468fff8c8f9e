use crate::models::VisitorSession;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use rbac_core::middleware::request_id_of;
use rbac_core::Decision;
use std::sync::Arc;

/// Roles a route accepts; empty means any signed-in user.
#[derive(Clone, Debug, Default)]
pub struct RequiredRoles(Arc<[String]>);

impl RequiredRoles {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of(roles: &[&str]) -> Self {
        Self(roles.iter().map(|r| r.to_string()).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Evaluate the route guard for every request to a protected route.
pub async fn guard_middleware(
    State((state, required)): State<(AppState, RequiredRoles)>,
    visitor: VisitorSession,
    request: Request,
    next: Next,
) -> Response {
    let session = visitor.current().await;
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    match state.guard.decide(&session, required.as_slice(), &path) {
        Decision::Render => next.run(request).await,
        Decision::Redirect(to) => {
            tracing::debug!(
                request_id = %request_id_of(&request),
                path = %path,
                redirect = %to,
                "Navigation blocked by route guard"
            );
            Redirect::to(&to).into_response()
        }
    }
}
