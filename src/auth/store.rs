// Persistent credential store
// Holds the token pair and the signed-in user across process restarts

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{AuthSession, Credentials};
use crate::models::user::{User, UserPatch};

/// Persisted session record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl StoredSession {
    /// An authenticated session always carries both tokens
    fn is_consistent(&self) -> bool {
        !self.is_authenticated || (self.access_token.is_some() && self.refresh_token.is_some())
    }
}

/// Thread-safe credential store, optionally backed by a JSON file
///
/// All accessors are synchronous so they can be called from inside the
/// refresh critical section.
pub struct CredentialStore {
    session: RwLock<StoredSession>,
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            session: RwLock::new(StoredSession::default()),
            path: None,
        }
    }

    /// Open a file-backed store, starting empty if the file is missing or unusable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match load_session(&path) {
            Ok(Some(session)) if session.is_consistent() => {
                tracing::debug!(
                    path = %path.display(),
                    authenticated = session.is_authenticated,
                    "Loaded stored session"
                );
                session
            }
            Ok(Some(_)) => {
                tracing::warn!(
                    path = %path.display(),
                    "Stored session is authenticated without both tokens, resetting"
                );
                StoredSession::default()
            }
            Ok(None) => StoredSession::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file: {:#}", e);
                StoredSession::default()
            }
        };

        Self {
            session: RwLock::new(session),
            path: Some(path),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoredSession> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write<F>(&self, update: F)
    where
        F: FnOnce(&mut StoredSession),
    {
        let mut session: RwLockWriteGuard<'_, StoredSession> =
            self.session.write().unwrap_or_else(|e| e.into_inner());
        update(&mut session);

        // Persist under the lock so the file always reflects the latest write
        if let Some(ref path) = self.path {
            if let Err(e) = save_session(path, &session) {
                tracing::warn!("Failed to persist session: {:#}", e);
            }
        }
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> StoredSession {
        self.read().clone()
    }

    pub fn credentials(&self) -> Credentials {
        let session = self.read();
        Credentials {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// Replace everything with a fresh login or registration
    pub fn set_session(&self, auth: AuthSession) {
        self.write(|session| {
            *session = StoredSession {
                user: Some(auth.user),
                access_token: Some(auth.access_token),
                refresh_token: Some(auth.refresh_token),
                is_authenticated: true,
            };
        });
    }

    /// Replace the access token alone, after a refresh
    pub fn set_access_token(&self, token: &str) {
        self.write(|session| session.access_token = Some(token.to_string()));
    }

    /// Record the user confirmed by the backend
    ///
    /// The session is only marked authenticated when both tokens are present.
    pub fn set_user(&self, user: User) {
        self.write(|session| {
            session.user = Some(user);
            session.is_authenticated =
                session.access_token.is_some() && session.refresh_token.is_some();
        });
    }

    /// Merge profile changes into the stored user; no-op when signed out
    pub fn update_user(&self, patch: UserPatch) {
        self.write(|session| {
            if let Some(ref mut user) = session.user {
                patch.apply(user);
            }
        });
    }

    /// Forget tokens and user
    pub fn clear(&self) {
        self.write(|session| *session = StoredSession::default());
        tracing::debug!("Credential store cleared");
    }
}

fn load_session(path: &Path) -> Result<Option<StoredSession>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let session = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse session file {}", path.display()))?;
    Ok(Some(session))
}

fn save_session(path: &Path, session: &StoredSession) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(session).context("Failed to serialize session")?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        // Tokens are bearer secrets
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(&json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
