//! Local Key/Value Store
//!
//! The client keeps a handful of values between runs, the same set a browser
//! build keeps in `localStorage`:
//!
//! - **session**: `authToken`, `currentUser`, `currentOrg`
//! - **preferences**: `debug`, `signupflow_locale`
//! - **feature unlocks**: `solver_runs_count`, `feature_unlock_dates`
//!
//! Everything else is owned by the backend.

pub mod error;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use kv::{get_json, set_json, FileStore, KeyValueStore, MemoryStore};

/// Well-known store keys
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const CURRENT_USER: &str = "currentUser";
    pub const CURRENT_ORG: &str = "currentOrg";
    pub const DEBUG: &str = "debug";
    pub const SIGNUP_LOCALE: &str = "signupflow_locale";
    pub const SOLVER_RUNS_COUNT: &str = "solver_runs_count";
    pub const FEATURE_UNLOCK_DATES: &str = "feature_unlock_dates";

    /// Keys cleared together on logout or 401
    pub const SESSION_KEYS: [&str; 3] = [AUTH_TOKEN, CURRENT_USER, CURRENT_ORG];
}

/// Whether the `debug` flag is switched on
pub fn debug_enabled(store: &dyn KeyValueStore) -> bool {
    matches!(
        store.get_item(keys::DEBUG).ok().flatten().as_deref(),
        Some("true") | Some("1")
    )
}
