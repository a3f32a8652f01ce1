//! Session Handling
//!
//! The logged-in user/org/token triple. It lives in the key/value store under
//! `authToken`, `currentUser` and `currentOrg` and is mirrored into an
//! in-process handle so every component reads the same value.
//!
//! Login sets it; logout or any 401 clears all three keys at once.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::storage::{get_json, keys, set_json, KeyValueStore, StorageError, StorageResult};

/// Logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

/// Organization the user is acting for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// User, organization and bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub org: Organization,
    pub auth_token: String,
}

/// Shared session handle backed by the key/value store
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionManager {
    /// Create a manager and restore any session already in the store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let manager = Self {
            store,
            current: Arc::new(RwLock::new(None)),
        };

        match manager.restore() {
            Ok(Some(session)) => {
                tracing::debug!(user_id = session.user.id, org_id = session.org.id, "Session restored");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Discarding unreadable session: {}", e),
        }

        manager
    }

    /// Reload the session from the store.
    ///
    /// A partial or malformed triple counts as no session.
    pub fn restore(&self) -> StorageResult<Option<Session>> {
        let loaded = self.read_from_store();
        let session = match loaded {
            Ok(session) => session,
            Err(e) => {
                self.set_current(None)?;
                return Err(e);
            }
        };
        self.set_current(session.clone())?;
        Ok(session)
    }

    fn read_from_store(&self) -> StorageResult<Option<Session>> {
        let token = self.store.get_item(keys::AUTH_TOKEN)?;
        let user: Option<User> = get_json(self.store.as_ref(), keys::CURRENT_USER)?;
        let org: Option<Organization> = get_json(self.store.as_ref(), keys::CURRENT_ORG)?;

        Ok(match (token, user, org) {
            (Some(auth_token), Some(user), Some(org)) if !auth_token.is_empty() => Some(Session {
                user,
                org,
                auth_token,
            }),
            _ => None,
        })
    }

    /// Persist and activate a session after login
    pub fn login(&self, session: Session) -> StorageResult<()> {
        self.store.set_item(keys::AUTH_TOKEN, &session.auth_token)?;
        set_json(self.store.as_ref(), keys::CURRENT_USER, &session.user)?;
        set_json(self.store.as_ref(), keys::CURRENT_ORG, &session.org)?;

        tracing::info!(user = %session.user.email, org = %session.org.name, "Logged in");
        self.set_current(Some(session))
    }

    /// Clear the session from memory and the store.
    ///
    /// The in-memory session is always dropped and every key removal is
    /// attempted; the first store error is returned.
    pub fn clear(&self) -> StorageResult<()> {
        let cleared = self.set_current(None);

        let mut first_error = None;
        for key in keys::SESSION_KEYS {
            if let Err(e) = self.store.remove_item(key) {
                tracing::warn!(key, "Could not remove session key: {}", e);
                first_error.get_or_insert(e);
            }
        }

        cleared?;
        first_error.map_or(Ok(()), Err)
    }

    /// Replace the organization (org switcher)
    pub fn switch_org(&self, org: Organization) -> StorageResult<()> {
        let mut current = self
            .current
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        if let Some(session) = current.as_mut() {
            set_json(self.store.as_ref(), keys::CURRENT_ORG, &org)?;
            session.org = org;
        }
        Ok(())
    }

    /// Snapshot of the active session
    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    /// Bearer token of the active session
    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.auth_token.clone()))
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().map(|s| s.is_some()).unwrap_or(false)
    }

    /// The underlying store
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    fn set_current(&self, session: Option<Session>) -> StorageResult<()> {
        let mut current = self
            .current
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        *current = session;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    pub(crate) fn sample_session() -> Session {
        Session {
            user: User {
                id: 7,
                email: "coord@example.org".to_string(),
                name: Some("Casey".to_string()),
                roles: vec!["admin".to_string()],
            },
            org: Organization {
                id: 3,
                name: "Harbor Food Bank".to_string(),
                timezone: Some("America/Chicago".to_string()),
            },
            auth_token: "token-abc".to_string(),
        }
    }

    #[test]
    fn test_login_persists_all_keys() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());
        assert!(!manager.is_loaded());

        manager.login(sample_session()).unwrap();

        assert!(manager.is_loaded());
        assert_eq!(manager.token().as_deref(), Some("token-abc"));
        assert_eq!(store.get_item(keys::AUTH_TOKEN).unwrap().as_deref(), Some("token-abc"));
        assert!(store.get_item(keys::CURRENT_USER).unwrap().is_some());
        assert!(store.get_item(keys::CURRENT_ORG).unwrap().is_some());
    }

    #[test]
    fn test_restore_from_store() {
        let store = Arc::new(MemoryStore::new());
        SessionManager::new(store.clone())
            .login(sample_session())
            .unwrap();

        let manager = SessionManager::new(store);
        assert_eq!(manager.current(), Some(sample_session()));
        assert!(manager.current().unwrap().user.is_admin());
    }

    #[test]
    fn test_partial_session_is_not_loaded() {
        let store = Arc::new(MemoryStore::new());
        store.set_item(keys::AUTH_TOKEN, "token-abc").unwrap();

        let manager = SessionManager::new(store);
        assert!(!manager.is_loaded());
    }

    #[test]
    fn test_malformed_user_is_not_loaded() {
        let store = Arc::new(MemoryStore::new());
        store.set_item(keys::AUTH_TOKEN, "token-abc").unwrap();
        store.set_item(keys::CURRENT_USER, "{not json").unwrap();
        store.set_item(keys::CURRENT_ORG, r#"{"id":1,"name":"x"}"#).unwrap();

        let manager = SessionManager::new(store);
        assert!(!manager.is_loaded());
    }

    #[test]
    fn test_clear_removes_session_keys_only() {
        let store = Arc::new(MemoryStore::new());
        store.set_item(keys::SIGNUP_LOCALE, "fr").unwrap();
        let manager = SessionManager::new(store.clone());
        manager.login(sample_session()).unwrap();

        manager.clear().unwrap();

        assert!(!manager.is_loaded());
        for key in keys::SESSION_KEYS {
            assert_eq!(store.get_item(key).unwrap(), None);
        }
        assert_eq!(store.get_item(keys::SIGNUP_LOCALE).unwrap().as_deref(), Some("fr"));
    }

    /// Store whose removals of one key always fail
    struct StuckKeyStore {
        inner: MemoryStore,
        stuck: &'static str,
    }

    impl KeyValueStore for StuckKeyStore {
        fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> StorageResult<()> {
            if key == self.stuck {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only data dir",
                )));
            }
            self.inner.remove_item(key)
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_clear_drops_memory_session_when_store_fails() {
        let store = Arc::new(StuckKeyStore {
            inner: MemoryStore::new(),
            stuck: keys::AUTH_TOKEN,
        });
        let manager = SessionManager::new(store.clone());
        manager.login(sample_session()).unwrap();

        let err = manager.clear().unwrap_err();

        assert!(matches!(err, StorageError::Io(_)));
        assert!(!manager.is_loaded());
        assert_eq!(manager.token(), None);
        assert_eq!(store.get_item(keys::CURRENT_USER).unwrap(), None);
        assert_eq!(store.get_item(keys::CURRENT_ORG).unwrap(), None);
    }

    #[test]
    fn test_switch_org() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());
        manager.login(sample_session()).unwrap();

        manager
            .switch_org(Organization {
                id: 9,
                name: "Riverside Shelter".to_string(),
                timezone: None,
            })
            .unwrap();

        assert_eq!(manager.current().unwrap().org.id, 9);
        let reloaded = SessionManager::new(store);
        assert_eq!(reloaded.current().unwrap().org.name, "Riverside Shelter");
    }
}
