use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{rest_path, SupabaseClient};

use crate::models::{parse_id, Conversation, Message, MessageRecord, MessagingError, SendMessageRequest};
use crate::services::identity::IdentityResolver;
use crate::services::summary::{peers_of, summarize_conversations};

pub struct MessagingService {
    supabase: SupabaseClient,
    identities: IdentityResolver,
}

impl MessagingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            identities: IdentityResolver::new(config),
        }
    }

    pub async fn send(&self, request: SendMessageRequest) -> Result<Message, MessagingError> {
        let sender_id = parse_id(&request.sender_id, "sender/receiver")?;
        let receiver_id = parse_id(&request.receiver_id, "sender/receiver")?;

        let content = request.content.trim();
        if content.is_empty() {
            return Err(MessagingError::EmptyContent);
        }

        let (sender, receiver) = tokio::try_join!(
            self.identities.resolve(sender_id),
            self.identities.resolve(receiver_id),
        )?;
        if sender.is_none() || receiver.is_none() {
            return Err(MessagingError::PartyNotFound);
        }

        let record: MessageRecord = self.supabase
            .insert("messages", json!({
                "sender_id": sender_id,
                "receiver_id": receiver_id,
                "content": content,
                "created_at": Utc::now().to_rfc3339(),
                "read_at": null
            }))
            .await?;

        info!("Message {} relayed from {} to {}", record.id, sender_id, receiver_id);
        Ok(record.to_public())
    }

    /// Marks the peer's unread messages as read, then returns the full
    /// history oldest first.
    pub async fn thread(&self, user_id: &str, peer_id: &str) -> Result<Vec<Message>, MessagingError> {
        let user_id = parse_id(user_id, "user/peer")?;
        let peer_id = parse_id(peer_id, "user/peer")?;
        debug!("Opening thread between {} and {}", user_id, peer_id);

        // Only rows still unread are touched, so read_at is set once.
        let marked: Vec<Value> = self.supabase
            .update(
                &rest_path(
                    "messages",
                    &format!("sender_id=eq.{}&receiver_id=eq.{}&read_at=is.null&select=id", peer_id, user_id),
                ),
                json!({ "read_at": Utc::now().to_rfc3339() }),
            )
            .await?;
        if !marked.is_empty() {
            debug!("Marked {} messages read for {}", marked.len(), user_id);
        }

        let history: Vec<MessageRecord> = self.supabase
            .select_all(&rest_path(
                "messages",
                &format!(
                    "or=(and(sender_id.eq.{u},receiver_id.eq.{p}),and(sender_id.eq.{p},receiver_id.eq.{u}))&order=created_at.asc,id.asc",
                    u = user_id,
                    p = peer_id,
                ),
            ))
            .await?;

        Ok(history.iter().map(MessageRecord::to_public).collect())
    }

    pub async fn conversations(&self, user_id: &str) -> Result<Vec<Conversation>, MessagingError> {
        let user_id = parse_id(user_id, "user")?;
        debug!("Listing conversations of {}", user_id);

        let newest_first: Vec<MessageRecord> = self.supabase
            .select_all(&rest_path(
                "messages",
                &format!("or=(sender_id.eq.{u},receiver_id.eq.{u})&order=created_at.desc,id.desc", u = user_id),
            ))
            .await?;

        let identities = self.identities.resolve_many(&peers_of(user_id, &newest_first)).await?;
        Ok(summarize_conversations(user_id, &newest_first, &identities))
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<u64, MessagingError> {
        let user_id: Uuid = parse_id(user_id, "user")?;

        Ok(self.supabase
            .count(&rest_path(
                "messages",
                &format!("receiver_id=eq.{}&read_at=is.null", user_id),
            ))
            .await?)
    }
}
