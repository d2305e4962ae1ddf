//! Per-session OTP managers

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::notify::Notifier;
use crate::otp::{Clock, OtpManager, OtpSettings, SystemClock};

/// Shared application state: one [`OtpManager`] per session
pub struct AppState {
    sessions: RwLock<HashMap<String, Arc<Mutex<OtpManager>>>>,
    settings: OtpSettings,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(settings: OtpSettings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            settings,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> OtpSettings {
        self.settings
    }

    /// Get the session's manager, creating it on first use
    pub async fn session(&self, session_id: &str) -> Arc<Mutex<OtpManager>> {
        if let Some(manager) = self.sessions.read().await.get(session_id) {
            return Arc::clone(manager);
        }

        let mut sessions = self.sessions.write().await;
        let manager = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!("Creating OTP session {}", session_id);
            Arc::new(Mutex::new(
                OtpManager::new(self.settings, Arc::clone(&self.notifier))
                    .with_clock(Arc::clone(&self.clock)),
            ))
        });
        Arc::clone(manager)
    }

    /// Get the session's manager without creating one
    pub async fn existing(&self, session_id: &str) -> Option<Arc<Mutex<OtpManager>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions with no live code (call periodically).
    ///
    /// A session is dropped when its code is gone or past its expiry. The
    /// manager's own lazy expiry is untouched; this only forgets the session.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, manager| {
            // A handler still holds this manager; it may be about to issue
            if Arc::strong_count(manager) > 1 {
                return true;
            }
            match manager.try_lock() {
                Ok(manager) => manager
                    .status()
                    .map(|status| status.expires_at >= now)
                    .unwrap_or(false),
                Err(_) => true,
            }
        });
        let removed = before - sessions.len();
        if removed > 0 {
            debug!("Dropped {} idle OTP sessions", removed);
        }
        removed
    }
}
