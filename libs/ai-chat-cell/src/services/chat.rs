use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{parse_session_id, AiChatError, ChatReply, ChatRequest, ChatRole};
use crate::services::gemini::{GeminiClient, ModelCache};
use crate::services::sessions::{required_user, SessionStore};

pub const FALLBACK_REPLY: &str = "I am here with you. Please tell me more.";

pub struct ChatService {
    sessions: SessionStore,
    gemini: GeminiClient,
    models: ModelCache,
}

impl ChatService {
    pub fn new(config: &AppConfig, models: ModelCache) -> Result<Self, AiChatError> {
        if !config.is_ai_configured() {
            return Err(AiChatError::MissingApiKey);
        }
        let gemini = GeminiClient::new(config).map_err(|e| AiChatError::Setup(e.to_string()))?;

        Ok(Self {
            sessions: SessionStore::new(config),
            gemini,
            models,
        })
    }

    /// One companion turn: both sides are stored in the session and the
    /// session preview follows the latest turn.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AiChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AiChatError::MissingMessage);
        }
        let user_id = required_user(&request.user_id)?;
        let session_id = parse_session_id(&request.session_id)?;

        if let Some(existing) = self.sessions.find(session_id).await? {
            if !existing.user_id.eq_ignore_ascii_case(user_id) {
                return Err(AiChatError::NotSessionOwner);
            }
        }
        debug!("Chat turn for {} in session {}", user_id, session_id);

        self.sessions.touch(session_id, user_id, message).await?;
        self.sessions.append_turn(session_id, user_id, ChatRole::User, message).await?;

        let model = self.models
            .get_or_pick(&self.gemini)
            .await
            .map_err(|e| AiChatError::Generation(e.to_string()))?;
        let reply = self.gemini
            .generate(&model, message)
            .await
            .map_err(|e| AiChatError::Generation(e.to_string()))?
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());

        self.sessions.append_turn(session_id, user_id, ChatRole::Assistant, &reply).await?;
        self.sessions.touch(session_id, user_id, &reply).await?;
        info!("Chat reply stored for session {} via {}", session_id, model);

        Ok(ChatReply { reply, model })
    }
}
