//! Conversation addressing types.
//!
//! Whether a request starts a new conversation or continues an existing one
//! is an explicit tagged variant rather than a pair of nullable fields, so
//! "absent id" cannot be confused with "null id" at the boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an incoming message addresses a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationKey {
    /// Start a new conversation; all identifiers are generated.
    New,
    /// Append to an existing conversation. A missing `message_uid` is
    /// generated server-side, scoped to the chat.
    Continue {
        chat_id: Uuid,
        message_uid: Option<Uuid>,
    },
}

impl ConversationKey {
    /// Build a key from the optional wire-level fields.
    ///
    /// A `message_uid` without a `chat_id` still starts a new conversation;
    /// the supplied uid is ignored because it has no chat to be scoped to.
    pub fn from_parts(chat_id: Option<Uuid>, message_uid: Option<Uuid>) -> Self {
        match chat_id {
            Some(chat_id) => ConversationKey::Continue {
                chat_id,
                message_uid,
            },
            None => ConversationKey::New,
        }
    }
}

/// The resolved identifier triple for one turn.
///
/// `response_session_id` is always freshly generated, even when the caller
/// resubmits the same `message_uid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnIds {
    pub chat_id: Uuid,
    pub message_uid: Uuid,
    pub response_session_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_without_chat_id_is_new() {
        assert_eq!(ConversationKey::from_parts(None, None), ConversationKey::New);
        // message_uid without a chat_id has nothing to scope to
        assert_eq!(
            ConversationKey::from_parts(None, Some(Uuid::now_v7())),
            ConversationKey::New
        );
    }

    #[test]
    fn test_from_parts_with_chat_id_continues() {
        let chat_id = Uuid::now_v7();
        let key = ConversationKey::from_parts(Some(chat_id), None);
        assert_eq!(
            key,
            ConversationKey::Continue {
                chat_id,
                message_uid: None
            }
        );
    }
}
