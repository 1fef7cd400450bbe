use std::collections::HashMap;

use uuid::Uuid;

use shared_models::identity::Identity;

use crate::models::{Conversation, MessageRecord};

pub const UNKNOWN_PEER_NAME: &str = "Unknown";
pub const UNKNOWN_PEER_ROLE: &str = "unknown";

/// Peers of `user_id` in first-seen order.
pub fn peers_of(user_id: Uuid, newest_first: &[MessageRecord]) -> Vec<Uuid> {
    let mut peers = Vec::new();
    for message in newest_first {
        let peer = peer_of(user_id, message);
        if !peers.contains(&peer) {
            peers.push(peer);
        }
    }
    peers
}

fn peer_of(user_id: Uuid, message: &MessageRecord) -> Uuid {
    if message.sender_id == user_id {
        message.receiver_id
    } else {
        message.sender_id
    }
}

/// One entry per peer from messages sorted newest first; the first
/// message seen for a peer is its latest.
pub fn summarize_conversations(
    user_id: Uuid,
    newest_first: &[MessageRecord],
    identities: &HashMap<Uuid, Identity>,
) -> Vec<Conversation> {
    let mut unread: HashMap<Uuid, usize> = HashMap::new();
    for message in newest_first {
        if message.receiver_id == user_id && message.is_unread() {
            *unread.entry(message.sender_id).or_default() += 1;
        }
    }

    let mut conversations: Vec<Conversation> = Vec::new();
    for message in newest_first {
        let peer_id = peer_of(user_id, message);
        if conversations.iter().any(|c| c.peer_id == peer_id) {
            continue;
        }

        let identity = identities.get(&peer_id);
        conversations.push(Conversation {
            peer_id,
            peer_name: identity.map_or(UNKNOWN_PEER_NAME, Identity::name).to_string(),
            peer_role: identity.map_or(UNKNOWN_PEER_ROLE, Identity::role).to_string(),
            peer_email: identity.map(Identity::email).unwrap_or_default().to_string(),
            last_message: message.content.clone(),
            last_at: message.created_at,
            unread_count: unread.get(&peer_id).copied().unwrap_or(0),
        });
    }

    conversations.sort_by(|a, b| b.last_at.cmp(&a.last_at));
    conversations
}
