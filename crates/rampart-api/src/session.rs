// Session storage
//
// The session is the only client-owned state: the identity returned by a
// successful login. It is written by login/logout and cleared by the client
// core on any 401, so a single atomic replace of one value is all the
// locking it needs.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The authenticated user's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Where the current session lives.
///
/// Implementations must treat unreadable or corrupt state as "no session"
/// rather than as an error.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<Session>;
    fn set(&self, session: Session);
    fn clear(&self);
}

// ── In-memory store ─────────────────────────────────────────────────

/// Session held for the lifetime of the process. Default for library use
/// and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// ── File-backed store ───────────────────────────────────────────────

/// Session persisted as a small JSON document, so it survives across CLI
/// invocations. Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, session: &Session) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(session).map_err(std::io::Error::other)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<Session> {
        let raw = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    fn set(&self, session: Session) {
        if let Err(e) = self.write(&session) {
            warn!(path = %self.path.display(), error = %e, "failed to persist session");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove session file"),
        }
    }
}
