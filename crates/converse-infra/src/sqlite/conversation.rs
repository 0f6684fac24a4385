//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `converse-core` using sqlx with
//! split read/write pools: raw queries, a private Row struct for
//! SQLite-to-domain mapping, rfc3339 datetime round-trips, and metadata
//! stored as a JSON text column.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use converse_core::repository::ConversationRepository;
use converse_types::error::RepositoryError;
use converse_types::turn::{ChatSummary, Page, Turn, TurnMetadata, TurnPatch};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Turn.
struct TurnRow {
    id: String,
    user_id: String,
    chat_id: String,
    message_uid: String,
    response_session_id: String,
    user_input: String,
    model_response: String,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            chat_id: row.try_get("chat_id")?,
            message_uid: row.try_get("message_uid")?,
            response_session_id: row.try_get("response_session_id")?,
            user_input: row.try_get("user_input")?,
            model_response: row.try_get("model_response")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        let id = parse_uuid(&self.id, "id")?;
        let chat_id = parse_uuid(&self.chat_id, "chat_id")?;
        let message_uid = parse_uuid(&self.message_uid, "message_uid")?;
        let response_session_id = parse_uuid(&self.response_session_id, "response_session_id")?;
        let metadata: TurnMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid metadata json: {e}")))?;

        Ok(Turn {
            id,
            user_id: self.user_id,
            chat_id,
            message_uid,
            response_session_id,
            user_input: self.user_input,
            model_response: self.model_response,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {field}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(db_err.message().to_string());
        }
    }
    RepositoryError::Query(e.to_string())
}

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, turn: &Turn) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_string(&turn.metadata)
            .map_err(|e| RepositoryError::Query(format!("metadata serialization: {e}")))?;

        sqlx::query(
            r#"INSERT INTO turns (id, user_id, chat_id, message_uid, response_session_id, user_input, model_response, metadata, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(&turn.user_id)
        .bind(turn.chat_id.to_string())
        .bind(turn.message_uid.to_string())
        .bind(turn.response_session_id.to_string())
        .bind(&turn.user_input)
        .bind(&turn.model_response)
        .bind(metadata)
        .bind(format_datetime(&turn.created_at))
        .bind(format_datetime(&turn.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_by_chat(&self, chat_id: &Uuid, page: Page) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM turns WHERE chat_id = ?
               ORDER BY created_at ASC, id ASC
               LIMIT ? OFFSET ?"#,
        )
        .bind(chat_id.to_string())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                TurnRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_turn()
            })
            .collect()
    }

    async fn list_chats(
        &self,
        user_id: Option<&str>,
        page: Page,
    ) -> Result<Vec<ChatSummary>, RepositoryError> {
        // SQLite allows bare columns with GROUP BY; user_id is constant
        // within a chat.
        let mut sql = String::from(
            "SELECT chat_id, user_id, COUNT(*) AS turn_count, MAX(created_at) AS last_activity FROM turns",
        );
        if user_id.is_some() {
            sql.push_str(" WHERE user_id = ?");
        }
        sql.push_str(" GROUP BY chat_id ORDER BY last_activity DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        let rows = query
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                let chat_id: String = row
                    .try_get("chat_id")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let user_id: String = row
                    .try_get("user_id")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let turn_count: i64 = row
                    .try_get("turn_count")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let last_activity: String = row
                    .try_get("last_activity")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;

                Ok(ChatSummary {
                    chat_id: parse_uuid(&chat_id, "chat_id")?,
                    user_id,
                    turn_count: turn_count as u32,
                    last_activity: parse_datetime(&last_activity)?,
                })
            })
            .collect()
    }

    async fn get_by_message(&self, message_uid: &Uuid) -> Result<Option<Turn>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM turns WHERE message_uid = ?")
            .bind(message_uid.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let turn_row = TurnRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(turn_row.into_turn()?))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_chat(&self, chat_id: &Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM turns WHERE chat_id = ?")
            .bind(chat_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(result.rows_affected())
    }

    async fn delete_by_record(&self, record_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM turns WHERE id = ?")
            .bind(record_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update(&self, record_id: &Uuid, patch: &TurnPatch) -> Result<Turn, RepositoryError> {
        let metadata = patch
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("metadata serialization: {e}")))?;

        let result = sqlx::query(
            r#"UPDATE turns
               SET model_response = COALESCE(?, model_response),
                   metadata = COALESCE(?, metadata),
                   updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&patch.model_response)
        .bind(metadata)
        .bind(format_datetime(&Utc::now()))
        .bind(record_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query("SELECT * FROM turns WHERE id = ?")
            .bind(record_id.to_string())
            .fetch_one(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;
        TurnRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_turn()
    }
}
