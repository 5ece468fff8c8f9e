use crate::models::CurrentUser;
use askama::Template;
use axum::response::IntoResponse;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub name: String,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

#[derive(Template)]
#[template(path = "area.html")]
pub struct AreaTemplate {
    pub name: String,
    pub title: &'static str,
    pub role: &'static str,
}

pub async fn dashboard_handler(user: CurrentUser) -> impl IntoResponse {
    DashboardTemplate {
        name: user.display_name(),
        roles: user.roles().to_vec(),
        is_admin: user.is_admin(),
    }
}

fn area(user: &CurrentUser, title: &'static str, role: &'static str) -> AreaTemplate {
    AreaTemplate {
        name: user.display_name(),
        title,
        role,
    }
}

pub async fn user_area(user: CurrentUser) -> impl IntoResponse {
    area(&user, "User area", "User")
}

pub async fn manager_area(user: CurrentUser) -> impl IntoResponse {
    area(&user, "Manager area", "Manager")
}

pub async fn admin_area(user: CurrentUser) -> impl IntoResponse {
    area(&user, "Admin area", "Admin")
}
