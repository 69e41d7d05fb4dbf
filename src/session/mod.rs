//! Per-session state that outlives a single request cycle.
//!
//! The store is an explicit map from session id to [`Session`], shared by
//! every execution. Each operation takes the lock once; callers never hold
//! it across an await point. Sessions idle for longer than the TTL are
//! evicted whenever a new one is opened, and the map never exceeds its cap.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Display name reported when no image has been uploaded.
pub const NO_IMAGE: &str = "No image uploaded";

pub const DEFAULT_MAX_SESSIONS: usize = 1000;
pub const DEFAULT_IDLE_TTL_MINUTES: u32 = 60;

/// The uploaded source image.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub source: Option<SourceImage>,
    /// Id of the last trigger taken off the wire.
    pub consumed_trigger: Option<String>,
    /// Set while an external call for this session is in flight.
    pub processing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source: None,
            consumed_trigger: None,
            processing: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn source_filename(&self) -> &str {
        self.source
            .as_ref()
            .map(|s| s.filename.as_str())
            .unwrap_or(NO_IMAGE)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        !self.processing && self.updated_at < cutoff
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            filename: self.source_filename().to_string(),
            has_image: self.source.is_some(),
            size_bytes: self.source.as_ref().map_or(0, |s| s.bytes.len()),
            mime_type: self.source.as_ref().and_then(|s| s.mime_type.clone()),
            processing: self.processing,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only view of a session for the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub filename: String,
    pub has_image: bool,
    pub size_bytes: usize,
    pub mime_type: Option<String>,
    pub processing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TTL_MINUTES)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `max_sessions` (at least one), each evicted
    /// after `idle_ttl_minutes` without activity.
    pub fn with_limits(max_sessions: usize, idle_ttl_minutes: u32) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_ttl: Duration::minutes(i64::from(idle_ttl_minutes)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drops idle sessions past the TTL, then the least recently used ones
    /// until there is room for one more.
    fn make_room(&self, sessions: &mut HashMap<String, Session>) {
        let cutoff = Utc::now() - self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, session| !session.idle_since(cutoff));

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|session| (session.processing, session.updated_at))
                .map(|session| session.id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before.saturating_sub(sessions.len());
        if evicted > 0 {
            log::info!("Evicted {} idle session(s)", evicted);
        }
    }

    /// Creates an empty session and returns its id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        self.make_room(&mut sessions);
        sessions.insert(id.clone(), Session::new(id.clone()));
        log::debug!("Session {} created", id);
        id
    }

    pub fn exists(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Runs `f` against an existing session. Unknown ids are left alone.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.lock().get_mut(id).map(f)
    }

    /// Runs `f` against the session, opening it empty on first use.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.lock();
        if !sessions.contains_key(id) {
            self.make_room(&mut sessions);
            log::debug!("Session {} opened", id);
        }
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id));
        f(session)
    }

    /// Replaces the stored image in one step.
    pub fn put(&self, id: &str, bytes: Vec<u8>, filename: impl Into<String>, mime_type: Option<String>) {
        let filename = filename.into();
        log::info!("Session {}: stored '{}' ({} bytes)", id, filename, bytes.len());
        self.update(id, |session| {
            session.source = Some(SourceImage {
                bytes,
                filename,
                mime_type,
            });
            session.touch();
        });
    }

    /// The current image, or `None` for the empty sentinel.
    pub fn get(&self, id: &str) -> Option<SourceImage> {
        self.lock().get(id).and_then(|s| s.source.clone())
    }

    pub fn source_filename(&self, id: &str) -> String {
        self.lock()
            .get(id)
            .map(|s| s.source_filename().to_string())
            .unwrap_or_else(|| NO_IMAGE.to_string())
    }

    pub fn clear(&self, id: &str) {
        if let Some(session) = self.lock().get_mut(id) {
            session.source = None;
            session.touch();
            log::info!("Session {}: image cleared", id);
        }
    }

    pub fn summary(&self, id: &str) -> Option<SessionSummary> {
        self.lock().get(id).map(Session::summary)
    }

    /// Ends a session. Returns false when it did not exist.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            log::debug!("Session {} ended", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_reports_sentinel() {
        let store = SessionStore::new();
        let id = store.create();
        assert!(store.get(&id).is_none());
        assert_eq!(store.source_filename(&id), NO_IMAGE);
        assert_eq!(store.source_filename("unknown"), NO_IMAGE);
    }

    #[test]
    fn test_put_replaces_previous_image() {
        let store = SessionStore::new();
        let id = store.create();
        store.put(&id, vec![1, 2, 3], "first.png", None);
        store.put(&id, vec![4, 5], "second.jpg", Some("image/jpeg".into()));

        let source = store.get(&id).unwrap();
        assert_eq!(source.bytes, vec![4, 5]);
        assert_eq!(source.filename, "second.jpg");
        assert_eq!(source.mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_with_session_never_inserts() {
        let store = SessionStore::new();
        assert_eq!(store.with_session("unknown", |session| session.touch()), None);
        assert!(store.is_empty());

        let id = store.create();
        assert_eq!(store.with_session(&id, |session| session.id.clone()), Some(id));
    }

    #[test]
    fn test_store_is_capped_least_recently_used_first() {
        let store = SessionStore::with_limits(2, DEFAULT_IDLE_TTL_MINUTES);
        let first = store.create();
        let second = store.create();
        store.with_session(&second, |session| {
            session.updated_at = Utc::now() - Duration::minutes(1)
        });

        let third = store.create();
        assert_eq!(store.len(), 2);
        assert!(store.exists(&first));
        assert!(!store.exists(&second));
        assert!(store.exists(&third));
    }

    #[test]
    fn test_idle_sessions_expire_when_a_session_opens() {
        let store = SessionStore::with_limits(10, 5);
        let stale = store.create();
        let busy = store.create();
        let past = Utc::now() - Duration::minutes(6);
        store.with_session(&stale, |session| session.updated_at = past);
        store.with_session(&busy, |session| {
            session.updated_at = past;
            session.processing = true;
        });

        store.update("fresh", |session| session.touch());
        assert!(!store.exists(&stale));
        assert!(store.exists(&busy));
        assert!(store.exists("fresh"));
    }

    #[test]
    fn test_clear_and_remove() {
        let store = SessionStore::new();
        let id = store.create();
        store.put(&id, vec![1], "a.png", None);
        store.clear(&id);
        assert!(store.get(&id).is_none());
        assert!(store.exists(&id));

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        store.put(&a, vec![9], "a.png", None);

        assert!(store.get(&b).is_none());
        assert_eq!(store.len(), 2);

        let summary = store.summary(&a).unwrap();
        assert!(summary.has_image);
        assert_eq!(summary.size_bytes, 1);
        assert!(!summary.processing);
    }
}
