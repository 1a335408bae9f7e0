use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_SESSION_NAME: &str = "New Session";
pub const MAX_SESSION_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatSession {
    pub id: i64,
    pub user_id: i64,
    pub session_name: String,
    pub created_date: DateTime<Utc>,
    /// Set once a career plan has been generated from this conversation.
    pub has_career_plan: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: i64,
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

impl ChatMessage {
    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User.as_str()
    }
}

/// Cuts a name to the stored column width, respecting char boundaries.
pub fn clamp_session_name(name: &str) -> String {
    name.chars().take(MAX_SESSION_NAME_CHARS).collect()
}
