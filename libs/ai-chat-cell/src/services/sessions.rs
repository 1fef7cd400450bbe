use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{rest_path, SupabaseClient};

use crate::models::{
    AiChatError, AiMessage, AiMessageRecord, ChatRole, ChatSession, ChatSessionRecord,
};

/// Chat sessions and their turns.
pub struct SessionStore {
    supabase: SupabaseClient,
}

impl SessionStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create(&self, user_id: &str, title: Option<&str>) -> Result<ChatSession, AiChatError> {
        let user_id = required_user(user_id)?;
        let now = Utc::now().to_rfc3339();

        let record: ChatSessionRecord = self.supabase
            .insert("chat_sessions", json!({
                "user_id": user_id,
                "title": title.map(str::trim).unwrap_or_default(),
                "last_message": "",
                "last_at": now,
                "created_at": now,
                "updated_at": now
            }))
            .await?;
        info!("Chat session {} created for {}", record.id, user_id);

        Ok(record.to_public())
    }

    pub async fn find(&self, session_id: Uuid) -> Result<Option<ChatSessionRecord>, AiChatError> {
        Ok(self.supabase
            .select_one(&rest_path("chat_sessions", &format!("id=eq.{}", session_id)))
            .await?)
    }

    pub async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<ChatSession>, AiChatError> {
        let user_id = required_user(user_id)?;
        debug!("Listing chat sessions of {}", user_id);

        let records: Vec<ChatSessionRecord> = self.supabase
            .select(&rest_path(
                "chat_sessions",
                &format!(
                    "user_id=eq.{}&order=last_at.desc.nullslast&limit={}",
                    urlencoding::encode(user_id),
                    limit
                ),
            ))
            .await?;

        Ok(records.iter().map(ChatSessionRecord::to_public).collect())
    }

    pub async fn rename(&self, session_id: Uuid, title: Option<&str>) -> Result<ChatSession, AiChatError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AiChatError::MissingTitle)?;

        let updated: Vec<ChatSessionRecord> = self.supabase
            .update(
                &rest_path("chat_sessions", &format!("id=eq.{}", session_id)),
                json!({ "title": title, "updated_at": Utc::now().to_rfc3339() }),
            )
            .await?;

        updated
            .first()
            .map(ChatSessionRecord::to_public)
            .ok_or(AiChatError::SessionNotFound)
    }

    /// Removes the session and every turn recorded in it.
    pub async fn delete(&self, session_id: Uuid) -> Result<(), AiChatError> {
        self.supabase
            .delete(&rest_path("ai_messages", &format!("session_id=eq.{}", session_id)))
            .await?;
        self.supabase
            .delete(&rest_path("chat_sessions", &format!("id=eq.{}", session_id)))
            .await?;
        info!("Chat session {} deleted", session_id);
        Ok(())
    }

    /// Creates the session on first use, otherwise moves its preview to
    /// `last_message`. The title is never touched.
    pub async fn touch(&self, session_id: Uuid, user_id: &str, last_message: &str) -> Result<(), AiChatError> {
        let now = Utc::now().to_rfc3339();
        let _: Value = self.supabase
            .upsert("chat_sessions", "id", json!({
                "id": session_id,
                "user_id": user_id,
                "last_message": last_message,
                "last_at": now,
                "updated_at": now
            }))
            .await?;
        Ok(())
    }

    pub async fn append_turn(
        &self,
        session_id: Uuid,
        user_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<AiMessage, AiChatError> {
        let record: AiMessageRecord = self.supabase
            .insert("ai_messages", json!({
                "user_id": user_id,
                "session_id": session_id,
                "role": role,
                "content": content,
                "created_at": Utc::now().to_rfc3339()
            }))
            .await?;
        Ok(record.to_public())
    }

    pub async fn history(&self, user_id: &str, session_id: Uuid, limit: usize) -> Result<Vec<AiMessage>, AiChatError> {
        let user_id = required_user(user_id)?;
        debug!("Fetching chat history of session {}", session_id);

        let records: Vec<AiMessageRecord> = self.supabase
            .select(&rest_path(
                "ai_messages",
                &format!(
                    "user_id=eq.{}&session_id=eq.{}&order=created_at.asc&limit={}",
                    urlencoding::encode(user_id),
                    session_id,
                    limit
                ),
            ))
            .await?;

        Ok(records.iter().map(AiMessageRecord::to_public).collect())
    }
}

pub(crate) fn required_user(raw: &str) -> Result<&str, AiChatError> {
    let user_id = raw.trim();
    if user_id.is_empty() {
        Err(AiChatError::MissingUserId)
    } else {
        Ok(user_id)
    }
}
