pub mod admin;
pub mod app;
pub mod auth;
pub mod user;

use validator::ValidationErrors;

/// First human-readable message out of a failed form validation.
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please check the form and try again.".to_string())
}
