use crate::models::CurrentUser;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rbac_core::roster::ASSIGNABLE_ROLES;
use rbac_core::Roster;

const LOAD_FAILED: &str = "Failed to load users";

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub rows: Vec<AdminRow>,
    pub error: Option<String>,
}

pub struct AdminRow {
    pub email: String,
    pub name: String,
    pub created: String,
    pub roles: Vec<String>,
    pub add_actions: Vec<RoleAction>,
    pub remove_actions: Vec<RoleAction>,
}

/// A role button and the form action it posts to.
pub struct RoleAction {
    pub role: String,
    pub action: String,
}

fn role_action(user_id: &str, role: &str, remove: bool) -> RoleAction {
    let mut action = format!(
        "/admin/users/{}/roles/{}",
        urlencoding::encode(user_id),
        urlencoding::encode(role)
    );
    if remove {
        action.push_str("/delete");
    }
    RoleAction {
        role: role.to_string(),
        action,
    }
}

fn rows_from(roster: &Roster) -> Vec<AdminRow> {
    roster
        .entries()
        .map(|(user, roles)| AdminRow {
            email: user.email.clone(),
            name: user.full_name(),
            created: user.created_display(),
            roles: roles.to_vec(),
            add_actions: ASSIGNABLE_ROLES
                .iter()
                .map(|role| role_action(&user.id, role, false))
                .collect(),
            remove_actions: roles
                .iter()
                .map(|role| role_action(&user.id, role, true))
                .collect(),
        })
        .collect()
}

fn render(roster: Option<&Roster>, status: StatusCode, error: Option<String>) -> Response {
    let rows = roster.map(rows_from).unwrap_or_default();
    (status, AdminTemplate { rows, error }).into_response()
}

fn error_text(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Roster table, always reloaded from the server on navigation.
pub async fn admin_dashboard_handler(State(state): State<AppState>, user: CurrentUser) -> Response {
    match state.roster.load(&user.access_token).await {
        Ok(roster) => render(Some(&roster), StatusCode::OK, None),
        Err(e) => render(
            None,
            StatusCode::BAD_GATEWAY,
            Some(error_text(e.to_string(), LOAD_FAILED)),
        ),
    }
}

pub async fn add_role_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, role)): Path<(String, String)>,
) -> Response {
    let result = state
        .roster
        .add_role(&user.access_token, &user_id, &role)
        .await;
    after_command(&state, &user, result.err().map(|e| e.to_string())).await
}

pub async fn remove_role_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, role)): Path<(String, String)>,
) -> Response {
    let result = state
        .roster
        .remove_role(&user.access_token, &user_id, &role)
        .await;
    after_command(&state, &user, result.err().map(|e| e.to_string())).await
}

/// Render the table after a role command.
///
/// Successful commands have already patched the cached roster; failed ones
/// have already reconciled it with the server.
async fn after_command(state: &AppState, user: &CurrentUser, error: Option<String>) -> Response {
    let roster = match state.roster.cached().await {
        Some(roster) => Ok(roster),
        None => state.roster.load(&user.access_token).await,
    };

    match (roster, error) {
        (Ok(roster), None) => render(Some(&roster), StatusCode::OK, None),
        (Ok(roster), Some(message)) => render(
            Some(&roster),
            StatusCode::BAD_GATEWAY,
            Some(error_text(message, "Role update failed")),
        ),
        (Err(e), command_error) => render(
            None,
            StatusCode::BAD_GATEWAY,
            Some(error_text(command_error.unwrap_or_else(|| e.to_string()), LOAD_FAILED)),
        ),
    }
}
