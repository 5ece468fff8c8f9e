//! Shared helpers for rbac-core integration tests.

#![allow(dead_code)]

use base64::{engine::general_purpose, Engine as _};
use rbac_core::config::ApiConfig;
use rbac_core::{ApiClient, KeyValueStore, MemoryStore, SessionStore};
use serde_json::Value;
use std::sync::Arc;
use wiremock::MockServer;

/// Unsigned JWT-shaped token carrying `payload` as its claims.
pub fn token_with(payload: Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.test-signature")
}

/// Far-future expiry (2100-01-01).
pub const FUTURE_EXP: i64 = 4_102_444_800;

pub fn api_for(server: &MockServer) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(&ApiConfig::new(server.uri())).expect("api client"))
}

pub fn session_for(server: &MockServer) -> (SessionStore, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let store = SessionStore::hydrate(api_for(server), storage.clone() as Arc<dyn KeyValueStore>);
    (store, storage)
}
