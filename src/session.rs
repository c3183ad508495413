//! Server-side session state: anti-forgery tokens and the one-shot flash
//! message shown on the product list.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sid";

pub type SessionId = Uuid;

/// Per-session storage of anti-forgery tokens, keyed by controller.
pub trait TokenStore: Send + Sync {
    fn token(&self, session: SessionId, key: &str) -> Option<String>;

    fn store_token(&self, session: SessionId, key: &str, token: String);
}

/// Sessions idle for longer than this are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct SessionData {
    tokens: HashMap<String, String>,
    flash: Option<String>,
    last_seen: Instant,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            tokens: HashMap::new(),
            flash: None,
            last_seen: Instant::now(),
        }
    }
}

pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionData>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Resolves the session named by the request cookie, minting a new id when
    /// the cookie is absent, unknown or expired. The flag is true for a new id.
    /// A new id is only stored once a token or flash message is written to it.
    pub fn resolve(&self, headers: &HeaderMap) -> (SessionId, bool) {
        let mut sessions = self.lock();
        let now = Instant::now();
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, data| now.duration_since(data.last_seen) < idle_timeout);

        if let Some(id) = session_cookie(headers) {
            if let Some(data) = sessions.get_mut(&id) {
                data.last_seen = now;
                return (id, false);
            }
        }
        (Uuid::new_v4(), true)
    }

    pub fn set_flash(&self, session: SessionId, message: impl Into<String>) {
        self.touch(session, |data| data.flash = Some(message.into()));
    }

    pub fn take_flash(&self, session: SessionId) -> Option<String> {
        self.lock().get_mut(&session).and_then(|data| data.flash.take())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(&self, session: SessionId, update: impl FnOnce(&mut SessionData)) {
        let mut sessions = self.lock();
        let data = sessions.entry(session).or_default();
        data.last_seen = Instant::now();
        update(data);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionData>> {
        // a poisoned map still holds valid sessions
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for SessionStore {
    fn token(&self, session: SessionId, key: &str) -> Option<String> {
        self.lock()
            .get(&session)
            .and_then(|data| data.tokens.get(key).cloned())
    }

    fn store_token(&self, session: SessionId, key: &str, token: String) {
        self.touch(session, |data| {
            data.tokens.insert(key.to_string(), token);
        });
    }
}

pub fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn set_cookie_header(session: SessionId) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}
