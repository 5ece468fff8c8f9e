use askama::Template;
use axum::{http::StatusCode, response::IntoResponse};

#[derive(Template)]
#[template(path = "not_authorized.html")]
pub struct NotAuthorizedTemplate {}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn not_authorized() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, NotAuthorizedTemplate {})
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NotFoundTemplate {})
}
