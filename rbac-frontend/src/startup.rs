use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use rbac_core::middleware::{
    request_id_middleware, same_origin_middleware, security_headers_middleware,
    REQUEST_ID_HEADER,
};
use rbac_core::ApiClient;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{SessionSettings, Settings};
use crate::handlers::{
    admin::{add_role_handler, admin_dashboard_handler, remove_role_handler},
    app::{health_check, not_authorized, not_found},
    auth::{login_handler, login_page, logout_handler, register_handler, register_page},
    user::{admin_area, dashboard_handler, manager_area, user_area},
};
use crate::middleware::guard::{guard_middleware, RequiredRoles};
use crate::middleware::session::visitor_session_middleware;
use crate::AppState;

pub fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let api = ApiClient::new(&settings.api)?;
    Ok(AppState::new(api, settings.routes.clone()))
}

fn guarded(state: &AppState, required: RequiredRoles, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(from_fn_with_state((state.clone(), required), guard_middleware))
}

pub fn build_router(state: AppState, session: &SessionSettings) -> Router {
    // One cookie session per browser; the token itself stays server-side
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session.secure_cookie)
        .with_same_site(SameSite::Strict)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            session.idle_timeout_hours,
        )));

    let signed_in = guarded(
        &state,
        RequiredRoles::any(),
        Router::new().route("/", get(dashboard_handler)),
    );

    let users = guarded(
        &state,
        RequiredRoles::of(&["User"]),
        Router::new().route("/protected-user", get(user_area)),
    );

    let managers = guarded(
        &state,
        RequiredRoles::of(&["Manager"]),
        Router::new().route("/protected-manager", get(manager_area)),
    );

    let admins = guarded(
        &state,
        RequiredRoles::of(&["Admin"]),
        Router::new()
            .route("/admin", get(admin_dashboard_handler))
            .route("/admin/users/:id/roles/:role", post(add_role_handler))
            .route("/admin/users/:id/roles/:role/delete", post(remove_role_handler))
            .route("/protected-admin", get(admin_area)),
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(login_page).post(login_handler))
        .route("/register", get(register_page).post(register_handler))
        .route("/logout", post(logout_handler))
        .route("/not-authorized", get(not_authorized))
        .merge(signed_in)
        .merge(users)
        .merge(managers)
        .merge(admins)
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), visitor_session_middleware))
        .layer(session_layer)
        // Cross-site form posts are refused before any session is loaded
        .layer(from_fn(same_origin_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost so the span above sees the request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
