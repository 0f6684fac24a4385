//! History assembly: pagination validation and response-shape mapping.
//!
//! Pure and stateless. Stored turns go in, ordered client-facing views come
//! out; pagination parameters are validated and clamped here so neither the
//! store nor the transport layer has to care.

use converse_types::error::ChatError;
use converse_types::turn::{Page, Turn, TurnView};

/// Upper bound applied to caller-supplied limits.
pub const MAX_PAGE_LIMIT: i64 = 200;

/// Default page size when the caller supplies no limit.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Validate raw pagination parameters into a `Page`.
///
/// - `limit` defaults to 50 and is clamped to 200; `limit = 0` is valid
///   and yields an empty result.
/// - Negative `limit` or `offset` is a caller error.
/// - An offset past the available count is not an error; the store simply
///   returns nothing.
pub fn validate_page(limit: Option<i64>, offset: Option<i64>) -> Result<Page, ChatError> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit < 0 {
        return Err(ChatError::InvalidRequest(format!(
            "limit must be non-negative, got {limit}"
        )));
    }

    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(ChatError::InvalidRequest(format!(
            "offset must be non-negative, got {offset}"
        )));
    }

    Ok(Page {
        limit: limit.min(MAX_PAGE_LIMIT),
        offset,
    })
}

/// Map stored turns into the ordered view list served to clients.
///
/// Ordering is the store's (`created_at` ascending for chat history);
/// assembly preserves it.
pub fn assemble(turns: Vec<Turn>) -> Vec<TurnView> {
    turns.into_iter().map(TurnView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use converse_types::turn::TurnMetadata;
    use uuid::Uuid;

    fn turn(input: &str) -> Turn {
        Turn {
            id: Uuid::now_v7(),
            user_id: "u1".to_string(),
            chat_id: Uuid::now_v7(),
            message_uid: Uuid::now_v7(),
            response_session_id: Uuid::now_v7(),
            user_input: input.to_string(),
            model_response: "ok".to_string(),
            metadata: TurnMetadata::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let page = validate_page(None, None).unwrap();
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_limit_clamped_to_maximum() {
        let page = validate_page(Some(10_000), None).unwrap();
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_zero_limit_is_valid() {
        let page = validate_page(Some(0), Some(5)).unwrap();
        assert_eq!(page.limit, 0);
        assert_eq!(page.offset, 5);
    }

    #[test]
    fn test_negative_offset_rejected() {
        let err = validate_page(None, Some(-1)).unwrap_err();
        assert!(matches!(err, ChatError::InvalidRequest(_)));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let err = validate_page(Some(-10), None).unwrap_err();
        assert!(matches!(err, ChatError::InvalidRequest(_)));
    }

    #[test]
    fn test_assemble_preserves_order() {
        let turns = vec![turn("first"), turn("second"), turn("third")];
        let views = assemble(turns);
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].user_input, "first");
        assert_eq!(views[2].user_input, "third");
    }
}
