//! Typed errors the Context Health Engine raises at its component
//! boundary (SPEC_FULL.md §7). Each carries the session id it concerns.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextHealthError {
    #[error("session '{session_id}' not found")]
    SessionNotFound { session_id: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SummarizationError {
    #[error("session '{session_id}' not found")]
    SessionNotFound { session_id: String },
    #[error("session '{session_id}' has no summarizable messages")]
    NothingToSummarize { session_id: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    #[error("session '{session_id}' not found")]
    SessionNotFound { session_id: String },
    #[error("session '{session_id}' has already rotated to '{rotated_to}'")]
    AlreadyRotated { session_id: String, rotated_to: String },
    #[error("session '{session_id}' is within its rotation cooldown, retry after {retry_after_ms}ms")]
    Cooldown { session_id: String, retry_after_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_health_error_message_carries_session_id() {
        let err = ContextHealthError::SessionNotFound {
            session_id: "sess-1".to_string(),
        };
        assert_eq!(err.to_string(), "session 'sess-1' not found");
    }

    #[test]
    fn rotation_already_rotated_message() {
        let err = RotationError::AlreadyRotated {
            session_id: "sess-1".to_string(),
            rotated_to: "sess-2".to_string(),
        };
        assert_eq!(err.to_string(), "session 'sess-1' has already rotated to 'sess-2'");
    }

    #[test]
    fn rotation_cooldown_message_carries_retry_after() {
        let err = RotationError::Cooldown {
            session_id: "sess-1".to_string(),
            retry_after_ms: 5_000,
        };
        assert_eq!(
            err.to_string(),
            "session 'sess-1' is within its rotation cooldown, retry after 5000ms"
        );
    }
}
