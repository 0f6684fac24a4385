//! Turn, metadata, and history view types for Converse.
//!
//! A `Turn` is the unit of persistence: one user input paired with the AI
//! response it produced. History endpoints serve `TurnView` and
//! `ChatSummary` projections of stored turns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single scalar value allowed in turn metadata.
///
/// The source system stored metadata as a schema-less JSON document; here
/// the value space is a closed set of kinds, validated at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Float(f64),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Flag(b)
    }
}

/// Open, order-irrelevant key/value document attached to a turn.
pub type TurnMetadata = BTreeMap<String, MetadataValue>;

/// One user input plus its AI response.
///
/// Fully populated before persistence: a turn is written with both
/// `user_input` and `model_response` present, or not written at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// System-generated record id, immutable.
    pub id: Uuid,
    /// Requesting user; `"anonymous"` when no identity was supplied.
    pub user_id: String,
    /// Groups turns into one conversation.
    pub chat_id: Uuid,
    /// Unique to this turn's user input within the chat.
    pub message_uid: Uuid,
    /// Binds this user input to its AI response; unique across the store.
    pub response_session_id: Uuid,
    pub user_input: String,
    pub model_response: String,
    pub metadata: TurnMetadata,
    pub created_at: DateTime<Utc>,
    /// Changes only if the turn is amended after creation.
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied to an existing turn.
///
/// Only `model_response` and `metadata` may be amended; identifiers are
/// immutable once written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TurnPatch {
    pub model_response: Option<String>,
    pub metadata: Option<TurnMetadata>,
}

/// Validated pagination window for history queries.
///
/// Construct via `converse-core`'s history assembler, which clamps the
/// limit and rejects negative offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

/// Client-facing projection of a stored turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub chat_id: Uuid,
    pub message_uid: Uuid,
    pub response_session_id: Uuid,
    pub user_input: String,
    pub model_response: String,
    pub metadata: TurnMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<Turn> for TurnView {
    fn from(turn: Turn) -> Self {
        Self {
            chat_id: turn.chat_id,
            message_uid: turn.message_uid,
            response_session_id: turn.response_session_id,
            user_input: turn.user_input,
            model_response: turn.model_response,
            metadata: turn.metadata,
            created_at: turn.created_at,
        }
    }
}

/// One conversation in a user's chat list, ordered by most recent activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: Uuid,
    pub user_id: String,
    pub turn_count: u32,
    pub last_activity: DateTime<Utc>,
}
