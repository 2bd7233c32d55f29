//! # Interview Session Store
//!
//! Owns every live interview session for the lifetime of the process.
//!
//! ## Locking:
//! A single `Mutex` guards the whole map. Every mutation, and the capacity check in
//! [`SessionManager::create`], runs under that one lock, so two concurrent creates can
//! never both take the last free slot. Reads clone the session out so no guard is held
//! across an `.await`.
//!
//! ## Transitions:
//! `activate` and `complete` are typed operations on the stored [`InterviewSession`].
//! Both re-stamp their timestamp when repeated. Callers that must not complete twice use
//! [`SessionManager::complete_once`], which checks and transitions under one lock.
//! Turns append through [`SessionManager::append_if_active`] for the same reason: a
//! session completed while a reply was in flight takes no further entries.

use super::models::{ConversationMessage, InterviewConfig, InterviewSession, SessionStatus};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Thread-safe session registry with a concurrency ceiling.
#[derive(Debug)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, InterviewSession>>,
    max_concurrent_sessions: usize,
    max_session_duration: Duration,
}

impl SessionManager {
    pub fn new(max_concurrent_sessions: usize, max_session_duration: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_concurrent_sessions,
            max_session_duration,
        }
    }

    // A panic while holding the guard cannot leave a session half-updated: every
    // mutation is a single call on `InterviewSession`.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, InterviewSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a PENDING session and return its id.
    ///
    /// Fails with `CapacityExceeded` when the number of PENDING or ACTIVE sessions has
    /// already reached the ceiling.
    pub fn create(&self, config: InterviewConfig) -> AppResult<String> {
        let mut sessions = self.lock();

        let live = sessions.values().filter(|s| s.status().is_live()).count();
        if live >= self.max_concurrent_sessions {
            return Err(AppError::CapacityExceeded(self.max_concurrent_sessions));
        }

        let session_id = Uuid::new_v4().to_string();
        sessions.insert(
            session_id.clone(),
            InterviewSession::new(session_id.clone(), config),
        );

        info!(session_id = %session_id, live_sessions = live + 1, "Created interview session");
        Ok(session_id)
    }

    /// Snapshot of a session.
    pub fn get(&self, session_id: &str) -> Option<InterviewSession> {
        self.lock().get(session_id).cloned()
    }

    pub fn activate(&self, session_id: &str) -> bool {
        match self.lock().get_mut(session_id) {
            Some(session) => {
                session.activate(Utc::now());
                debug!(session_id, "Session activated");
                true
            }
            None => false,
        }
    }

    pub fn complete(&self, session_id: &str) -> bool {
        match self.lock().get_mut(session_id) {
            Some(session) => {
                session.complete(Utc::now());
                debug!(session_id, "Session completed");
                true
            }
            None => false,
        }
    }

    /// One-shot completion: check and transition under the same lock.
    ///
    /// Returns the completed snapshot, `NotFound`, or `InvalidState` when the session
    /// was already completed.
    pub fn complete_once(&self, session_id: &str) -> AppResult<InterviewSession> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if session.status() == SessionStatus::Completed {
            return Err(AppError::InvalidState("Session already completed".to_string()));
        }
        session.complete(Utc::now());
        Ok(session.clone())
    }

    /// Append only while the session is ACTIVE, checked under the same lock.
    ///
    /// Returns the updated snapshot, `NotFound`, or `InvalidState` for a PENDING or
    /// COMPLETED session.
    pub fn append_if_active(
        &self,
        session_id: &str,
        message: ConversationMessage,
    ) -> AppResult<InterviewSession> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if session.status() != SessionStatus::Active {
            return Err(AppError::InvalidState("Session not active".to_string()));
        }
        session.append(message);
        Ok(session.clone())
    }

    /// Append to the history. Does not check the session status.
    pub fn append_message(&self, session_id: &str, message: ConversationMessage) -> bool {
        match self.lock().get_mut(session_id) {
            Some(session) => {
                session.append(message);
                true
            }
            None => false,
        }
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    /// PENDING and ACTIVE sessions.
    pub fn list_active(&self) -> Vec<InterviewSession> {
        self.lock()
            .values()
            .filter(|s| s.status().is_live())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn max_concurrent_sessions(&self) -> usize {
        self.max_concurrent_sessions
    }

    /// Remove every session whose start time is older than the configured maximum
    /// duration. Returns how many were removed.
    pub fn expire_stale(&self) -> usize {
        let now = Utc::now();
        let max_age = self.max_session_duration;

        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|session_id, session| {
            let stale = session
                .start_time()
                .and_then(|start| now.signed_duration_since(start).to_std().ok())
                .is_some_and(|age| age > max_age);
            if stale {
                info!(session_id = %session_id, "Expiring stale interview session");
            }
            !stale
        });
        before - sessions.len()
    }

    /// `MM:SS` elapsed time, `"00:00"` for unknown or never-started sessions.
    pub fn duration_string(&self, session_id: &str) -> String {
        self.lock()
            .get(session_id)
            .map(|session| session.duration_string(Utc::now()))
            .unwrap_or_else(|| "00:00".to_string())
    }
}
