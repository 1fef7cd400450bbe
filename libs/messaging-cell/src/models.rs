use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

/// Row of the `messages` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MessageRecord {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl MessageRecord {
    pub fn to_public(&self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content.clone(),
            created_at: self.created_at,
            read_at: self.read_at,
        }
    }

    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Latest exchange with one peer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub peer_id: Uuid,
    pub peer_name: String,
    pub peer_role: String,
    pub peer_email: String,
    pub last_message: String,
    pub last_at: DateTime<Utc>,
    pub unread_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub peer_id: String,
}

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Invalid {0} id")]
    InvalidId(&'static str),

    #[error("Message content is required")]
    EmptyContent,

    #[error("Sender or receiver not found")]
    PartyNotFound,

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<MessagingError> for AppError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::InvalidId(_) | MessagingError::EmptyContent => AppError::BadRequest(err.to_string()),
            MessagingError::PartyNotFound => AppError::NotFound(err.to_string()),
            MessagingError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}

pub fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, MessagingError> {
    Uuid::parse_str(raw.trim()).map_err(|_| MessagingError::InvalidId(what))
}
