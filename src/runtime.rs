//! Session runtime
//!
//! Holds one conversation per browser session and runs the submit cycle:
//! append the user turn, ask the gateway, append its reply.

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

use crate::conversation::{Conversation, Turn};
use crate::gateway::CompletionGateway;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Sessions untouched for this long are dropped
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Reasons a submission is refused before anything is appended
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Session not found: {0}")]
    UnknownSession(String),
    #[error("Message is empty")]
    EmptyInput,
}

/// One live session
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Held for a whole submit cycle, so a session handles one submission at a time
    conversation: Mutex<Conversation>,
    /// Visible turn count, readable while a submission holds the conversation
    turns: AtomicUsize,
    /// Milliseconds since the manager's epoch at the last access
    last_active: AtomicU64,
}

impl Session {
    fn touch(&self, now: u64) {
        self.last_active.store(now, Ordering::Relaxed);
    }

    fn idle_for(&self, now: u64) -> Duration {
        Duration::from_millis(now.saturating_sub(self.last_active.load(Ordering::Relaxed)))
    }
}

/// Listing entry for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub turns: usize,
}

/// Result of one round trip
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub user: Turn,
    pub reply: Turn,
    /// Visible scrollback after the exchange
    pub turns: Vec<Turn>,
}

/// Manager for all chat sessions
pub struct SessionManager {
    gateway: CompletionGateway,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    idle_ttl: Duration,
    epoch: Instant,
}

impl SessionManager {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self {
            gateway,
            sessions: RwLock::new(HashMap::new()),
            idle_ttl: DEFAULT_SESSION_IDLE_TTL,
            epoch: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn model_id(&self) -> &str {
        self.gateway.model_id()
    }

    /// Start a session with a freshly seeded conversation
    pub async fn create_session(&self) -> Arc<Session> {
        self.sweep_idle().await;

        let session = Arc::new(Session {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            conversation: Mutex::new(Conversation::default()),
            turns: AtomicUsize::new(0),
            last_active: AtomicU64::new(self.now()),
        });

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());

        tracing::info!(session_id = %session.id, "Session created");
        session
    }

    /// Look up a live session and mark it active. Expired sessions are dropped.
    async fn get(&self, id: &str) -> Result<Arc<Session>, SubmitError> {
        let session = self
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SubmitError::UnknownSession(id.to_string()))?;

        let now = self.now();
        if session.idle_for(now) > self.idle_ttl {
            self.sessions.write().await.remove(id);
            tracing::info!(session_id = %id, "Session expired");
            return Err(SubmitError::UnknownSession(id.to_string()));
        }
        session.touch(now);
        Ok(session)
    }

    /// Drop every session idle for longer than the TTL
    pub async fn sweep_idle(&self) -> usize {
        let now = self.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_for(now) <= self.idle_ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Expired idle sessions");
        }
        removed
    }

    /// Scrollback for display, seed turn excluded
    pub async fn visible_turns(&self, id: &str) -> Result<Vec<Turn>, SubmitError> {
        let session = self.get(id).await?;
        let conversation = session.conversation.lock().await;
        Ok(conversation.visible().to_vec())
    }

    /// Every stored turn, seed included
    #[cfg(test)]
    pub async fn all_turns(&self, id: &str) -> Result<Vec<Turn>, SubmitError> {
        let session = self.get(id).await?;
        let conversation = session.conversation.lock().await;
        Ok(conversation.all().to_vec())
    }

    /// Run one user submission through the gateway.
    ///
    /// Appends exactly two turns: the user's text and the model reply (which
    /// may be an error turn). Blank input appends nothing.
    pub async fn submit(&self, id: &str, text: &str) -> Result<Exchange, SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        let session = self.get(id).await?;
        let mut conversation = session.conversation.lock().await;

        let user = Turn::user(text);
        conversation.append(user.clone());
        session.turns.store(conversation.visible().len(), Ordering::Relaxed);

        let reply = self.gateway.reply(&conversation).await;
        conversation.append(reply.clone());
        session.turns.store(conversation.visible().len(), Ordering::Relaxed);
        session.touch(self.now());

        tracing::debug!(
            session_id = %id,
            turns = conversation.len(),
            error = reply.is_error,
            "Exchange complete"
        );

        Ok(Exchange {
            user,
            reply,
            turns: conversation.visible().to_vec(),
        })
    }

    /// Drop a session and its conversation
    pub async fn delete_session(&self, id: &str) -> Result<(), SubmitError> {
        if self.sessions.write().await.remove(id).is_none() {
            return Err(SubmitError::UnknownSession(id.to_string()));
        }
        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// All live sessions, oldest first. Never waits on an in-flight submission.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .await
            .values()
            .map(|session| SessionSummary {
                id: session.id.clone(),
                created_at: session.created_at,
                turns: session.turns.load(Ordering::Relaxed),
            })
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }
}
