//! Wire-stable classification of why a tool CLI is unavailable.
//!
//! Each variant carries a fixed HTTP status, a stable string label, and
//! whether the caller should expect the condition to clear on retry. These
//! three facts never change for a given variant — they are part of the
//! wire contract consumers (the out-of-scope REST layer) rely on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailabilityReason {
    NotInstalled,
    NotInPath,
    PermissionDenied,
    VersionUnsupported,
    AuthRequired,
    AuthExpired,
    ConfigMissing,
    ConfigInvalid,
    DependencyMissing,
    McpUnreachable,
    SpawnFailed,
    Timeout,
    Crash,
    Unknown,
}

impl UnavailabilityReason {
    /// HTTP status the out-of-scope REST layer should map this reason to.
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotInstalled | Self::NotInPath => 404,
            Self::PermissionDenied => 403,
            Self::VersionUnsupported => 409,
            Self::AuthRequired | Self::AuthExpired => 401,
            Self::ConfigMissing | Self::ConfigInvalid => 412,
            Self::DependencyMissing => 424,
            Self::McpUnreachable => 503,
            Self::SpawnFailed => 500,
            Self::Timeout => 503,
            Self::Crash => 500,
            Self::Unknown => 500,
        }
    }

    /// Stable string label, stable across releases for telemetry grouping.
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotInstalled => "not_installed",
            Self::NotInPath => "not_in_path",
            Self::PermissionDenied => "permission_denied",
            Self::VersionUnsupported => "version_unsupported",
            Self::AuthRequired => "auth_required",
            Self::AuthExpired => "auth_expired",
            Self::ConfigMissing => "config_missing",
            Self::ConfigInvalid => "config_invalid",
            Self::DependencyMissing => "dependency_missing",
            Self::McpUnreachable => "mcp_unreachable",
            Self::SpawnFailed => "spawn_failed",
            Self::Timeout => "timeout",
            Self::Crash => "crash",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the caller should expect this condition to clear without
    /// operator intervention (e.g. a transient timeout) vs. requiring an
    /// install/config/auth fix.
    pub const fn retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::McpUnreachable | Self::SpawnFailed)
    }
}

impl std::fmt::Display for UnavailabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_is_4xx_or_5xx() {
        for reason in [
            UnavailabilityReason::NotInstalled,
            UnavailabilityReason::NotInPath,
            UnavailabilityReason::PermissionDenied,
            UnavailabilityReason::VersionUnsupported,
            UnavailabilityReason::AuthRequired,
            UnavailabilityReason::AuthExpired,
            UnavailabilityReason::ConfigMissing,
            UnavailabilityReason::ConfigInvalid,
            UnavailabilityReason::DependencyMissing,
            UnavailabilityReason::McpUnreachable,
            UnavailabilityReason::SpawnFailed,
            UnavailabilityReason::Timeout,
            UnavailabilityReason::Crash,
            UnavailabilityReason::Unknown,
        ] {
            assert!((400..=503).contains(&reason.http_status()));
        }
    }

    #[test]
    fn retryable_reasons_are_exactly_transient_ones() {
        assert!(UnavailabilityReason::Timeout.retryable());
        assert!(UnavailabilityReason::McpUnreachable.retryable());
        assert!(UnavailabilityReason::SpawnFailed.retryable());
        assert!(!UnavailabilityReason::NotInstalled.retryable());
        assert!(!UnavailabilityReason::AuthRequired.retryable());
    }

    #[test]
    fn label_roundtrips_through_serde() {
        let json = serde_json::to_string(&UnavailabilityReason::AuthRequired).unwrap();
        assert_eq!(json, "\"auth_required\"");
        let back: UnavailabilityReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UnavailabilityReason::AuthRequired);
    }
}
