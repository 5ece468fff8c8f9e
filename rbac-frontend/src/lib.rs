pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod startup;

use rbac_core::{ApiClient, RosterService, RouteGuard};
use std::sync::Arc;

/// Shared application state.
///
/// Holds nothing visitor-specific: each browser's session is loaded per
/// request by the visitor session middleware.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub roster: Arc<RosterService>,
    pub guard: Arc<RouteGuard>,
}

impl AppState {
    pub fn new(api: ApiClient, guard: RouteGuard) -> Self {
        let api = Arc::new(api);
        Self {
            roster: Arc::new(RosterService::new(api.clone())),
            api,
            guard: Arc::new(guard),
        }
    }
}
