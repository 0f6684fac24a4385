//! Identity allocation for incoming turns.
//!
//! Resolves a `ConversationKey` into the full identifier triple. UUID v7
//! keeps generated ids time-sortable and opaque (no embedded sequence or
//! PII); collision probability is negligible, so allocation is infallible.

use converse_types::identity::{ConversationKey, TurnIds};
use uuid::Uuid;

/// Resolve the `(chat_id, message_uid, response_session_id)` triple for a
/// request.
///
/// `response_session_id` is always freshly generated, regardless of caller
/// input -- it binds exactly one request to one response and must never
/// collide with a prior value, even on retry of the same logical message.
pub fn allocate(key: &ConversationKey) -> TurnIds {
    let (chat_id, message_uid) = match key {
        ConversationKey::New => (Uuid::now_v7(), Uuid::now_v7()),
        ConversationKey::Continue {
            chat_id,
            message_uid,
        } => (*chat_id, message_uid.unwrap_or_else(Uuid::now_v7)),
    };

    TurnIds {
        chat_id,
        message_uid,
        response_session_id: Uuid::now_v7(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_generates_all_ids() {
        let a = allocate(&ConversationKey::New);
        let b = allocate(&ConversationKey::New);
        assert_ne!(a.chat_id, b.chat_id);
        assert_ne!(a.message_uid, b.message_uid);
        assert_ne!(a.response_session_id, b.response_session_id);
    }

    #[test]
    fn test_continue_preserves_caller_ids() {
        let chat_id = Uuid::now_v7();
        let message_uid = Uuid::now_v7();
        let ids = allocate(&ConversationKey::Continue {
            chat_id,
            message_uid: Some(message_uid),
        });
        assert_eq!(ids.chat_id, chat_id);
        assert_eq!(ids.message_uid, message_uid);
    }

    #[test]
    fn test_continue_generates_missing_message_uid() {
        let chat_id = Uuid::now_v7();
        let a = allocate(&ConversationKey::Continue {
            chat_id,
            message_uid: None,
        });
        let b = allocate(&ConversationKey::Continue {
            chat_id,
            message_uid: None,
        });
        assert_eq!(a.chat_id, chat_id);
        assert_ne!(a.message_uid, b.message_uid);
    }

    #[test]
    fn test_response_session_id_fresh_on_resubmit() {
        let chat_id = Uuid::now_v7();
        let message_uid = Uuid::now_v7();
        let key = ConversationKey::Continue {
            chat_id,
            message_uid: Some(message_uid),
        };
        let first = allocate(&key);
        let retry = allocate(&key);
        assert_eq!(first.message_uid, retry.message_uid);
        assert_ne!(first.response_session_id, retry.response_session_id);
    }
}
