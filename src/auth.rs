//! Local session persistence.
//!
//! The session token returned by `auth/login` is stored as a small JSON
//! document on disk so that the next launch can skip the login screen.
//! Every read goes back to the file, so a logout in one place is seen by
//! the HTTP client on its very next request.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::source::LoginResponse;

/// What is written to the session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub role: String,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Self {
            token: resp.token,
            login: resp.login,
            role: resp.role,
        }
    }
}

/// File-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Persist `session`, creating parent directories as needed.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, body)
            .with_context(|| format!("Failed to write session {}", self.path.display()))?;
        debug!(path = %self.path.display(), login = %session.login, "session saved");
        Ok(())
    }

    /// Load the stored session.
    ///
    /// A missing file is `None`.  A corrupt file is also `None` (and logged):
    /// the user simply has to log in again.
    pub fn load(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Session>(&content) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable session file");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Forget the stored session.  Clearing an absent session is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove session {}", self.path.display())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            login: "chef".to_string(),
            role: "Admin".to_string(),
        }
    }

    #[test]
    fn missing_file_means_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        assert!(!store.has_token());
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_returns_same_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("session.json"));

        store.save(&session("abc")).unwrap();

        assert_eq!(store.load(), Some(session("abc")));
        assert_eq!(store.token().as_deref(), Some("abc"));
    }

    #[test]
    fn clear_removes_token_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        store.save(&session("abc")).unwrap();

        store.clear().unwrap();
        assert!(!store.has_token());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_or_empty_sessions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = TokenStore::new(&path);

        fs::write(&path, "not json").unwrap();
        assert!(store.load().is_none());

        fs::write(&path, r#"{"token": ""}"#).unwrap();
        assert!(!store.has_token());
    }

    #[test]
    fn session_from_login_response() {
        let resp = LoginResponse {
            token: "t".into(),
            login: "chef".into(),
            role: "User".into(),
        };
        let s = Session::from(resp);
        assert_eq!(s.token, "t");
        assert_eq!(s.role, "User");
    }
}
