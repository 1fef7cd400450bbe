use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Row of the `chat_sessions` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatSessionRecord {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_message: String,
    pub last_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSessionRecord {
    pub fn to_public(&self) -> ChatSession {
        ChatSession {
            id: self.id,
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            last_message: self.last_message.clone(),
            last_at: self.last_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub last_message: String,
    pub last_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `ai_messages` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AiMessageRecord {
    pub id: Uuid,
    pub user_id: String,
    pub session_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl AiMessageRecord {
    pub fn to_public(&self) -> AiMessage {
        AiMessage {
            id: self.id,
            user_id: self.user_id.clone(),
            session_id: self.session_id,
            role: self.role,
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiMessage {
    pub id: Uuid,
    pub user_id: String,
    pub session_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub session_id: String,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsQuery {
    #[serde(default)]
    pub user_id: String,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenameSessionRequest {
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum AiChatError {
    #[error("Message required")]
    MissingMessage,

    #[error("User ID required")]
    MissingUserId,

    #[error("Session ID required")]
    MissingSessionId,

    #[error("Title required")]
    MissingTitle,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session belongs to another user")]
    NotSessionOwner,

    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("AI client setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<AiChatError> for AppError {
    fn from(err: AiChatError) -> Self {
        match err {
            AiChatError::MissingMessage
            | AiChatError::MissingUserId
            | AiChatError::MissingSessionId
            | AiChatError::MissingTitle => AppError::BadRequest(err.to_string()),
            AiChatError::SessionNotFound => AppError::NotFound(err.to_string()),
            AiChatError::NotSessionOwner => AppError::Forbidden(err.to_string()),
            AiChatError::MissingApiKey => AppError::Upstream(err.to_string()),
            AiChatError::Generation(detail) => {
                tracing::error!("Gemini call failed: {}", detail);
                AppError::Upstream("AI failed".to_string())
            }
            AiChatError::Setup(_) => AppError::Internal(err.to_string()),
            AiChatError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}

/// Session ids are uuids; anything else can never match a stored session.
pub fn parse_session_id(raw: &str) -> Result<Uuid, AiChatError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AiChatError::MissingSessionId);
    }
    Uuid::parse_str(raw).map_err(|_| AiChatError::SessionNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_session_id() {
        assert_matches!(parse_session_id("  "), Err(AiChatError::MissingSessionId));
        assert_matches!(parse_session_id("abc"), Err(AiChatError::SessionNotFound));
        assert!(parse_session_id("0b6f7f3e-3f4c-4b6a-9d59-6b1f0c7f2a11").is_ok());
    }

    #[test]
    fn test_generation_failure_hides_detail() {
        let err: AppError = AiChatError::Generation("quota exceeded".to_string()).into();
        assert_matches!(err, AppError::Upstream(ref msg) if msg == "AI failed");

        let err: AppError = AiChatError::MissingApiKey.into();
        assert_matches!(err, AppError::Upstream(ref msg) if msg == "GEMINI_API_KEY not set");
    }
}
