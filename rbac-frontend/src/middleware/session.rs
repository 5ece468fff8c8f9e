use crate::models::VisitorSession;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use rbac_core::middleware::request_id_of;
use rbac_core::session::TOKEN_KEY;
use rbac_core::{KeyValueStore, MemoryStore, SessionStore};
use std::sync::Arc;
use tower_sessions::{session, Session};

/// Give the request a [`SessionStore`] backed by the visitor's cookie session.
///
/// The visitor's token is kept in their session record under
/// [`TOKEN_KEY`]. It seeds the store's storage slot before the handler runs
/// and is written back afterwards if login, register, logout or expiry
/// changed it. Requests without a session cookie start anonymous.
pub async fn visitor_session_middleware(
    State(state): State<AppState>,
    cookie: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request_id_of(&request).to_string();

    let before = match cookie.get::<String>(TOKEN_KEY).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read visitor session");
            None
        }
    };

    let slot = Arc::new(MemoryStore::new());
    if let Some(token) = &before {
        if let Err(e) = slot.set(TOKEN_KEY, token) {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to seed session slot");
        }
    }
    let store = SessionStore::hydrate(state.api.clone(), slot.clone());
    request
        .extensions_mut()
        .insert(VisitorSession(Arc::new(store)));

    let response = next.run(request).await;

    let after = slot.get(TOKEN_KEY).ok().flatten();
    if after != before {
        if let Err(e) = write_back(&cookie, after).await {
            tracing::error!(request_id = %request_id, error = %e, "Failed to update visitor session");
        }
    }

    response
}

async fn write_back(cookie: &Session, token: Option<String>) -> Result<(), session::Error> {
    match token {
        Some(token) => {
            // Fresh credentials get a fresh session id
            cookie.cycle_id().await?;
            cookie.insert(TOKEN_KEY, token).await
        }
        None => cookie.flush().await,
    }
}
