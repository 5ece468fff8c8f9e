use crate::handlers::validation_message;
use crate::models::VisitorSession;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use rbac_core::guard::safe_next;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use validator::Validate;

const LOGIN_FAILED: &str = "Invalid email or password. Please try again.";
const REGISTER_FAILED: &str = "Register failed";
const PASSWORD_REQUIRED: &str = "Password is required";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub error: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    pub password: Secret<String>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    pub password: Secret<String>,
}

/// Field checks plus the password, which `validator` cannot see through
/// `Secret`.
fn check_form(form: &impl Validate, password: &Secret<String>) -> Result<(), String> {
    form.validate().map_err(|errors| validation_message(&errors))?;
    if password.expose_secret().is_empty() {
        return Err(PASSWORD_REQUIRED.to_string());
    }
    Ok(())
}

pub async fn login_page(visitor: VisitorSession, Query(query): Query<NextQuery>) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();

    if visitor.is_authenticated().await {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        email: String::new(),
        next,
        error: None,
    }
    .into_response()
}

pub async fn login_handler(visitor: VisitorSession, Form(payload): Form<LoginForm>) -> Response {
    let next = safe_next(payload.next.as_deref()).to_string();

    if let Err(message) = check_form(&payload, &payload.password) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                email: payload.email,
                next,
                error: Some(message),
            },
        )
            .into_response();
    }

    match visitor.login(&payload.email, &payload.password).await {
        Ok(_) => {
            tracing::info!(email = %payload.email, "User logged in");
            Redirect::to(&next).into_response()
        }
        Err(e) => {
            tracing::warn!(email = %payload.email, error = %e, "Login failed");
            (
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    email: payload.email,
                    next,
                    error: Some(LOGIN_FAILED.to_string()),
                },
            )
                .into_response()
        }
    }
}

pub async fn register_page(visitor: VisitorSession) -> Response {
    if visitor.is_authenticated().await {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        error: None,
    }
    .into_response()
}

pub async fn register_handler(
    visitor: VisitorSession,
    Form(payload): Form<RegisterForm>,
) -> Response {
    let failed = |payload: RegisterForm, status: StatusCode, message: String| {
        (
            status,
            RegisterTemplate {
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                error: Some(message),
            },
        )
            .into_response()
    };

    if let Err(message) = check_form(&payload, &payload.password) {
        return failed(payload, StatusCode::UNPROCESSABLE_ENTITY, message);
    }

    let result = visitor
        .register(
            &payload.email,
            &payload.password,
            &payload.first_name,
            &payload.last_name,
        )
        .await;

    match result {
        Ok(_) => {
            tracing::info!(email = %payload.email, "User registered");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(email = %payload.email, error = %e, "Registration failed");
            let message = match e.to_string() {
                m if m.trim().is_empty() => REGISTER_FAILED.to_string(),
                m => m,
            };
            failed(payload, StatusCode::UNPROCESSABLE_ENTITY, message)
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    visitor: VisitorSession,
) -> impl IntoResponse {
    visitor.logout().await;
    Redirect::to(&state.guard.login_path)
}
