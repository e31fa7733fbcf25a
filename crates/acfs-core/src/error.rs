//! Small error vocabulary shared across coordination cores.
//!
//! Component-specific failures (registry load, rotation, maintenance
//! transitions) get their own `thiserror` enums in their owning crate; this
//! one only holds the handful of failure shapes more than one crate needs
//! to name identically (a bounded subprocess/collector timing out, or being
//! cancelled out from under it).

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("{operation} was cancelled")]
    Cancelled { operation: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_includes_operation_and_duration() {
        let err = GatewayError::Timeout {
            operation: "probe claude-code".into(),
            after_ms: 2500,
        };
        assert_eq!(
            err.to_string(),
            "probe claude-code timed out after 2500ms"
        );
    }

    #[test]
    fn cancelled_message_includes_operation() {
        let err = GatewayError::Cancelled {
            operation: "collect ntm".into(),
        };
        assert_eq!(err.to_string(), "collect ntm was cancelled");
    }
}
