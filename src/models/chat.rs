use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Append-only conversation between two accounts, optionally tied to a booking.
/// Messages keep insertion order; unread counters are per participant slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub participants: [Uuid; 2],
    pub messages: Vec<ChatMessage>,
    pub unread: [u32; 2],
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn participant_index(&self, account_id: Uuid) -> Option<usize> {
        self.participants.iter().position(|p| *p == account_id)
    }

    pub fn unread_for(&self, account_id: Uuid) -> u32 {
        self.participant_index(account_id)
            .map_or(0, |idx| self.unread[idx])
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::Conversation;

    #[test]
    fn unread_is_tracked_per_participant() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let conversation = Conversation {
            id: Uuid::new_v4(),
            booking_id: None,
            participants: [a, b],
            messages: Vec::new(),
            unread: [0, 3],
            created_at: Utc::now(),
        };

        assert_eq!(conversation.unread_for(a), 0);
        assert_eq!(conversation.unread_for(b), 3);
        assert_eq!(conversation.unread_for(Uuid::from_u128(9)), 0);
    }
}
