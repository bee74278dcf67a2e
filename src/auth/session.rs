//! Session state and session stores

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Reserved session key holding the authenticated user id
pub const UID_KEY: &str = "uid";

/// Server-side state surviving across requests, referenced by a session id
/// carried in a cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: String,
    data: HashMap<String, String>,
    created_at: chrono::DateTime<chrono::Utc>,
    last_accessed: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Create a fresh session with a new id
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            data: HashMap::new(),
            created_at: now,
            last_accessed: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), value.to_string());
    }

    pub fn data(&self) -> &HashMap<String, String> {
        &self.data
    }

    /// Authenticated user id, if any
    pub fn uid(&self) -> Option<&str> {
        self.get(UID_KEY)
    }

    /// Record the authenticated user id. The first write wins; a uid already
    /// present is authoritative and is left untouched.
    pub fn set_uid(&mut self, uid: &str) {
        if self.uid().is_none() {
            self.insert(UID_KEY, uid);
        }
    }

    /// Check if the session has been idle longer than the given expiry
    pub fn is_expired(&self, max_idle_minutes: i64) -> bool {
        let now = chrono::Utc::now();
        now.signed_duration_since(self.last_accessed).num_minutes() > max_idle_minutes
    }

    /// Update last accessed time
    pub fn touch(&mut self) {
        self.last_accessed = chrono::Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyed session storage shared across requests. Implementations provide
/// their own concurrency safety; the auth core performs no extra locking.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the live session for `id`, or a fresh one (with a new id) when
    /// `id` is absent, unknown, or expired
    async fn open(&self, id: Option<&str>) -> Result<Session>;

    /// Persist the session under its id
    async fn save(&self, session: &Session) -> Result<()>;

    /// Delete the session entry for `id`
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    expiry_minutes: i64,
}

impl MemorySessionStore {
    pub fn new(expiry_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            expiry_minutes,
        }
    }

    /// Cleanup expired sessions
    pub async fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write().await;
        let expiry = self.expiry_minutes;
        sessions.retain(|_, session| !session.is_expired(expiry));
    }

    /// Get session count
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn open(&self, id: Option<&str>) -> Result<Session> {
        let mut sessions = self.sessions.write().await;

        if let Some(id) = id {
            if let Some(session) = sessions.get_mut(id) {
                if session.is_expired(self.expiry_minutes) {
                    sessions.remove(id);
                } else {
                    session.touch();
                    return Ok(session.clone());
                }
            }
        }

        let session = Session::new();
        sessions.insert(session.id().to_string(), session.clone());
        Ok(session)
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

impl Clone for MemorySessionStore {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            expiry_minutes: self.expiry_minutes,
        }
    }
}

/// File-backed session store, one JSON document per session
pub struct FileSessionStore {
    dir: PathBuf,
    expiry_minutes: i64,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>, expiry_minutes: i64) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::SessionInit(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir, expiry_minutes })
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        // Session ids are UUIDs; anything else never names a file
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        Some(self.dir.join(format!("{}.json", id)))
    }

    async fn write_session(&self, session: &Session) -> Result<()> {
        let path = self
            .path_for(session.id())
            .ok_or_else(|| Error::SessionInit(format!("invalid session id {:?}", session.id())))?;
        let body = serde_json::to_vec(session)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| Error::SessionInit(format!("cannot write {}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn open(&self, id: Option<&str>) -> Result<Session> {
        if let Some(path) = id.and_then(|id| self.path_for(id)) {
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => {
                    let mut session: Session = serde_json::from_str(&body).map_err(|e| {
                        Error::SessionInit(format!("corrupt session {}: {}", path.display(), e))
                    })?;
                    if session.is_expired(self.expiry_minutes) {
                        let _ = tokio::fs::remove_file(&path).await;
                    } else {
                        session.touch();
                        self.write_session(&session).await?;
                        return Ok(session);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::SessionInit(format!(
                        "cannot read {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        let session = Session::new();
        self.write_session(&session).await?;
        Ok(session)
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.write_session(session).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if let Some(path) = self.path_for(id) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::SessionInit(format!(
                        "cannot delete {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }
}
