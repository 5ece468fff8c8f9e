//! rbac-core: session, token and access-control core for the RBAC front-end.
pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod observability;
pub mod roster;
pub mod session;
pub mod storage;
pub mod token;

pub use api::ApiClient;
pub use error::{ApiError, SessionError, StorageError};
pub use guard::{Access, Decision, RouteGuard};
pub use roster::{Roster, RosterService};
pub use session::{Session, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
