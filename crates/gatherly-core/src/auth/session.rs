use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Session lifetime in hours.
/// Matches the server's cookie lifetime of one week.
const SESSION_EXPIRY_HOURS: i64 = 24 * 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: impl Into<String>, user_id: i64, username: Option<String>) -> Self {
        Self {
            token: token.into(),
            user_id,
            username,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let expiry = self.created_at + Duration::hours(SESSION_EXPIRY_HOURS);
        Utc::now() > expiry
    }

    /// Hours remaining until expiry (for display)
    pub fn hours_until_expiry(&self) -> i64 {
        let expiry = self.created_at + Duration::hours(SESSION_EXPIRY_HOURS);
        (expiry - Utc::now()).num_hours().max(0)
    }
}

/// Session persisted to disk between runs of the front end.
pub struct Session {
    data_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            data: None,
        }
    }

    /// Load session from disk. Returns false when missing or expired.
    pub fn load(&mut self) -> std::io::Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }

        let contents = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<SessionData>(&contents) {
            Ok(data) if !data.is_expired() => {
                self.data = Some(data);
                Ok(true)
            }
            Ok(_) => {
                debug!("Stored session has expired");
                Ok(false)
            }
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable session file");
                Ok(false)
            }
        }
    }

    /// Save session to disk
    pub fn save(&self) -> std::io::Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> std::io::Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

/// Shared view of the current session for the API client and managers.
/// Clones share state, so signing out through one handle is seen by all.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<SessionData>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, data: SessionData) {
        info!(user_id = data.user_id, "Signed in");
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = Some(data);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.take().is_some() {
            info!("Signed out");
        }
    }

    fn current(&self) -> Option<SessionData> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.as_ref().filter(|data| !data.is_expired()).cloned()
    }

    /// Bearer token if the session is valid
    pub fn token(&self) -> Option<String> {
        self.current().map(|d| d.token)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.current().map(|d| d.user_id)
    }

    /// True when a session exists and has not expired
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }
}
