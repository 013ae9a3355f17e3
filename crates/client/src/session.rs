//! Session store - the single owner of the signed-in identity.
//!
//! The historical client read `localStorage` ad hoc from every component,
//! which is why its variants disagreed about login state. Here all reads and
//! writes of the credential go through [`SessionStore`]; interested
//! components learn about changes via [`Signal::SessionChanged`] rather than
//! re-reading persistent storage on every render.
//!
//! The session survives process restarts in a small JSON file (the CLI
//! equivalent of browser-persistent storage).

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use xeno_armory_core::Role;

use crate::notify::{Notifier, Signal};

/// Errors from persisting session state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to persist session to {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The signed-in identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer credential proving the identity to the backend.
    pub token: String,
    /// Name shown in the navigation bar and order views.
    pub display_name: String,
    /// Role used for the client-side admin gate.
    pub role: Role,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Shared, persistent store for the current [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    path: PathBuf,
    state: RwLock<Option<Session>>,
    notifier: Notifier,
}

impl SessionStore {
    /// Create a store, loading any previously persisted session.
    ///
    /// An unreadable or malformed session file is treated as "not logged
    /// in" rather than an error - the user simply logs in again.
    #[must_use]
    pub fn load(path: PathBuf, notifier: Notifier) -> Self {
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    debug!(user = %session.display_name, "Restored persisted session");
                    Some(session)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring malformed session file");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            inner: Arc::new(SessionStoreInner {
                path,
                state: RwLock::new(state),
                notifier,
            }),
        }
    }

    /// Snapshot of the current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read_state().clone()
    }

    /// The bearer credential, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read_state().as_ref().map(|s| s.token.clone())
    }

    /// True when a credential is present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.read_state().is_some()
    }

    /// True when the signed-in role passes the admin gate.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read_state().as_ref().is_some_and(|s| s.role.is_admin())
    }

    /// Store a new session (after login/register) and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written. The
    /// in-memory session is stored either way, so the current process keeps
    /// working.
    pub fn store(&self, session: Session) -> Result<(), SessionError> {
        *self.write_state() = Some(session.clone());
        self.inner.notifier.signal(Signal::SessionChanged);

        let json = serde_json::to_string_pretty(&session)
            .unwrap_or_else(|_| String::from("{}"));
        std::fs::write(&self.inner.path, json).map_err(|source| SessionError::Persist {
            path: self.inner.path.clone(),
            source,
        })
    }

    /// Explicit logout: drop the session and delete the persisted file.
    pub fn clear(&self) {
        *self.write_state() = None;
        if let Err(e) = std::fs::remove_file(&self.inner.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.inner.path.display(), error = %e, "Failed to remove session file");
        }
        self.inner.notifier.signal(Signal::SessionChanged);
    }

    /// The backend rejected the credential (401): the session is gone
    /// whether we like it or not. Same cleanup as logout, different log.
    pub fn invalidate(&self) {
        if self.read_state().is_some() {
            debug!("Backend rejected credential; dropping session");
            self.clear();
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        // Lock poisoning would require a panic mid-write; recover the data.
        self.inner.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("armory-session-test-{name}-{}", std::process::id()))
    }

    fn sample_session() -> Session {
        Session {
            token: "jwt-abc123".to_string(),
            display_name: "commander".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_store_and_restore_roundtrip() {
        let path = temp_session_path("roundtrip");
        let store = SessionStore::load(path.clone(), Notifier::new());
        assert!(!store.is_logged_in());

        store.store(sample_session()).expect("persist session");

        // A fresh store against the same file sees the session.
        let restored = SessionStore::load(path.clone(), Notifier::new());
        assert!(restored.is_logged_in());
        assert!(restored.is_admin());
        assert_eq!(restored.token().as_deref(), Some("jwt-abc123"));

        store.clear();
        assert!(!std::path::Path::new(&path).exists());
    }

    #[test]
    fn test_malformed_file_means_logged_out() {
        let path = temp_session_path("malformed");
        std::fs::write(&path, "not json at all").expect("write file");

        let store = SessionStore::load(path.clone(), Notifier::new());
        assert!(!store.is_logged_in());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_invalidate_clears_session() {
        let path = temp_session_path("invalidate");
        let store = SessionStore::load(path.clone(), Notifier::new());
        store.store(sample_session()).expect("persist session");

        store.invalidate();
        assert!(!store.is_logged_in());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_store_emits_session_changed() {
        let path = temp_session_path("signal");
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let store = SessionStore::load(path.clone(), notifier);

        store.store(sample_session()).expect("persist session");

        match rx.try_recv().expect("event") {
            crate::notify::Event::Signal(signal) => {
                assert_eq!(signal, Signal::SessionChanged);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug_output = format!("{:?}", sample_session());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("jwt-abc123"));
    }
}
