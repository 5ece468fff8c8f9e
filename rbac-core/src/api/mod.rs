pub mod client;
pub mod dtos;

pub use client::ApiClient;
pub use dtos::{LoginRequest, RegisterRequest, TokenResponse, UserRow};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const USERS_PATH: &str = "/api/users";

pub fn user_roles_path(user_id: &str) -> String {
    format!("{}/{}/roles", USERS_PATH, urlencoding::encode(user_id))
}

pub fn user_role_path(user_id: &str, role: &str) -> String {
    format!("{}/{}", user_roles_path(user_id), urlencoding::encode(role))
}
