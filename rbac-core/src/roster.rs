//! Admin roster: every user with their assigned roles.
//!
//! Loading fans out one role request per user and joins on all of them.
//! Role commands patch the cached roster on success and reload it from the
//! server on failure, so the cache converges to server state after errors.

use crate::api::{user_role_path, user_roles_path, ApiClient, UserRow, USERS_PATH};
use crate::error::ApiError;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Roles the admin table offers to grant.
pub const ASSIGNABLE_ROLES: [&str; 3] = ["User", "Manager", "Admin"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub users: Vec<UserRow>,
    pub roles_by_user: HashMap<String, Vec<String>>,
}

impl Roster {
    pub fn roles_for(&self, user_id: &str) -> &[String] {
        self.roles_by_user
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Users paired with their roles, in listing order.
    pub fn entries(&self) -> impl Iterator<Item = (&UserRow, &[String])> + '_ {
        self.users
            .iter()
            .map(move |user| (user, self.roles_for(&user.id)))
    }

    fn grant(&mut self, user_id: &str, role: &str) {
        let roles = self.roles_by_user.entry(user_id.to_string()).or_default();
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
    }

    fn revoke(&mut self, user_id: &str, role: &str) {
        if let Some(roles) = self.roles_by_user.get_mut(user_id) {
            roles.retain(|r| r != role);
        }
    }
}

/// Fetch users and, concurrently, each user's roles.
///
/// The first failing request fails the whole fetch; no partial roster is
/// returned.
pub async fn fetch_roster(api: &ApiClient, token: &str) -> Result<Roster, ApiError> {
    let users: Vec<UserRow> = api.get(USERS_PATH, Some(token)).await?;

    let role_sets = try_join_all(users.iter().map(|user| async move {
        let path = user_roles_path(&user.id);
        let roles: Vec<String> = api.get(&path, Some(token)).await?;
        Ok::<_, ApiError>((user.id.clone(), roles))
    }))
    .await?;

    Ok(Roster {
        roles_by_user: role_sets.into_iter().collect(),
        users,
    })
}

/// Holds the last successfully loaded roster for this process.
pub struct RosterService {
    api: Arc<ApiClient>,
    cache: RwLock<Option<Roster>>,
}

impl RosterService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            cache: RwLock::new(None),
        }
    }

    /// Reload from the server, replacing the cache.
    ///
    /// A failed load clears the cache rather than keeping stale rows.
    pub async fn load(&self, token: &str) -> Result<Roster, ApiError> {
        match fetch_roster(&self.api, token).await {
            Ok(roster) => {
                tracing::debug!(users = roster.users.len(), "Roster loaded");
                *self.cache.write().await = Some(roster.clone());
                Ok(roster)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load roster");
                *self.cache.write().await = None;
                Err(e)
            }
        }
    }

    pub async fn cached(&self) -> Option<Roster> {
        self.cache.read().await.clone()
    }

    pub async fn add_role(&self, token: &str, user_id: &str, role: &str) -> Result<(), ApiError> {
        let result: Result<(), ApiError> = self
            .api
            .post::<(), ()>(&user_role_path(user_id, role), None, Some(token))
            .await;

        match result {
            Ok(()) => {
                tracing::info!(user_id = %user_id, role = %role, "Role granted");
                if let Some(roster) = self.cache.write().await.as_mut() {
                    roster.grant(user_id, role);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, role = %role, error = %e, "Failed to grant role");
                self.reconcile(token).await;
                Err(e)
            }
        }
    }

    pub async fn remove_role(
        &self,
        token: &str,
        user_id: &str,
        role: &str,
    ) -> Result<(), ApiError> {
        let result: Result<(), ApiError> = self
            .api
            .delete(&user_role_path(user_id, role), Some(token))
            .await;

        match result {
            Ok(()) => {
                tracing::info!(user_id = %user_id, role = %role, "Role revoked");
                if let Some(roster) = self.cache.write().await.as_mut() {
                    roster.revoke(user_id, role);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, role = %role, error = %e, "Failed to revoke role");
                self.reconcile(token).await;
                Err(e)
            }
        }
    }

    async fn reconcile(&self, token: &str) {
        // load() already logs and clears the cache on failure
        let _ = self.load(token).await;
    }
}
