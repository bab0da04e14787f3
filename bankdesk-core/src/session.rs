//! Session context injected into the list controller and API client
//!
//! Replaces ambient token/user storage with an explicit object. The
//! controller only ever calls `invalidate()`; the client reads `token()`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DeskError, Result};
use crate::users::Role;

/// Signed-in user as cached at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl SessionUser {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Admins and managers may open the user-management list.
    pub fn can_manage_users(&self) -> bool {
        matches!(self.role(), Some(Role::Admin | Role::Manager))
    }
}

/// Token and user persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

pub trait SessionContext: Send + Sync {
    fn token(&self) -> Option<String>;

    fn current_user(&self) -> Option<SessionUser>;

    /// Forget the token and user. Called when the server rejects the token.
    fn invalidate(&self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

fn lock(slot: &Mutex<Option<StoredSession>>) -> MutexGuard<'_, Option<StoredSession>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local session.
#[derive(Debug, Default)]
pub struct MemorySession {
    slot: Mutex<Option<StoredSession>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>, user: Option<SessionUser>) -> Self {
        Self {
            slot: Mutex::new(Some(StoredSession {
                token: token.into(),
                user,
            })),
        }
    }

    pub fn store(&self, session: StoredSession) {
        *lock(&self.slot) = Some(session);
    }
}

impl SessionContext for MemorySession {
    fn token(&self) -> Option<String> {
        lock(&self.slot).as_ref().map(|s| s.token.clone())
    }

    fn current_user(&self) -> Option<SessionUser> {
        lock(&self.slot).as_ref().and_then(|s| s.user.clone())
    }

    fn invalidate(&self) {
        lock(&self.slot).take();
    }
}

/// Session kept in a JSON file (default `~/.bankdesk/session.json`).
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    cached: Mutex<Option<StoredSession>>,
}

impl FileSession {
    /// Open the session file, treating a missing file as signed out.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cached = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let session = serde_json::from_str(&content).map_err(|source| DeskError::Session {
                path: path.clone(),
                source,
            })?;
            Some(session)
        } else {
            None
        };
        Ok(Self {
            path,
            cached: Mutex::new(cached),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(DeskError::NoHomeDir)?;
        Ok(home.join(".bankdesk").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a new session, replacing any previous one.
    pub fn save(&self, session: StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&session).map_err(|source| {
            DeskError::Session {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "session saved");
        *lock(&self.cached) = Some(session);
        Ok(())
    }
}

impl SessionContext for FileSession {
    fn token(&self) -> Option<String> {
        lock(&self.cached).as_ref().map(|s| s.token.clone())
    }

    fn current_user(&self) -> Option<SessionUser> {
        lock(&self.cached).as_ref().and_then(|s| s.user.clone())
    }

    fn invalidate(&self) {
        lock(&self.cached).take();
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "session removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), error = %err, "failed to remove session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teller() -> SessionUser {
        SessionUser {
            id: 3,
            name: "Teller".into(),
            email: "teller@abcbank.com".into(),
            role: "Staff".into(),
        }
    }

    #[test]
    fn role_checks() {
        let mut user = teller();
        assert!(!user.can_manage_users());
        user.role = "manager".into();
        assert!(user.can_manage_users());
        assert!(!user.is_admin());
        user.role = "ADMIN".into();
        assert!(user.is_admin());
    }

    #[test]
    fn memory_session_invalidates() {
        let session = MemorySession::signed_in("tok", Some(teller()));
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert!(session.is_authenticated());
        session.invalidate();
        assert_eq!(session.token(), None);
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn file_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let session = FileSession::open(&path).unwrap();
        assert!(!session.is_authenticated());

        session
            .save(StoredSession {
                token: "abc".into(),
                user: Some(teller()),
            })
            .unwrap();

        let reopened = FileSession::open(&path).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("abc"));
        assert_eq!(reopened.current_user(), Some(teller()));

        reopened.invalidate();
        assert!(!path.exists());
        assert_eq!(reopened.token(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileSession::open(&path),
            Err(DeskError::Session { .. })
        ));
    }
}
