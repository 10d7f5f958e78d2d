//! In-process conversation sessions
//!
//! Each session keeps a short window of user/assistant exchanges; the
//! history reaches the engine only as a formatted summary string. Sessions
//! do not survive process restarts.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

struct Session {
    exchanges: Vec<(String, String)>,
    #[allow(dead_code)] // Retained for future session expiry
    created_at: DateTime<Utc>,
}

/// Thread-safe session store
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
    max_history: usize,
}

impl SessionManager {
    /// `max_history` is the number of retained exchanges (question/answer
    /// pairs) per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Create a new empty session and return its id
    pub fn create_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.write().unwrap().insert(
            id.clone(),
            Session {
                exchanges: Vec::new(),
                created_at: Utc::now(),
            },
        );
        id
    }

    /// Formatted history for a session, `None` when absent or empty
    pub fn history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap();
        let session = sessions.get(session_id)?;
        if session.exchanges.is_empty() {
            return None;
        }
        let formatted = session
            .exchanges
            .iter()
            .map(|(user, assistant)| format!("User: {user}\nAssistant: {assistant}"))
            .collect::<Vec<_>>()
            .join("\n");
        Some(formatted)
    }

    /// Record one exchange, creating the session if needed and trimming to
    /// the history window.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                exchanges: Vec::new(),
                created_at: Utc::now(),
            });
        session
            .exchanges
            .push((user.to_string(), assistant.to_string()));
        if session.exchanges.len() > self.max_history {
            let excess = session.exchanges.len() - self.max_history;
            session.exchanges.drain(..excess);
        }
    }

    /// Drop a session entirely
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.write().unwrap().remove(session_id);
    }
}
