//! Unavailability classification and auth-error detection
//! (SPEC_FULL.md §4.D). Regex tables are compiled once via `once_cell`,
//! never inside the probe hot path (REDESIGN FLAGS).

use acfs_core::UnavailabilityReason;
use once_cell::sync::Lazy;
use regex::Regex;

pub static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?\d+\.\d+(\.\d+)?(-[\w.]+)?").expect("valid version regex"));

/// Ordered stderr → reason table. First match wins.
static STDERR_PATTERNS: Lazy<Vec<(Regex, UnavailabilityReason)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)command not found|not recognized").unwrap(),
            UnavailabilityReason::NotInstalled,
        ),
        (
            Regex::new(r"(?i)permission denied|eacces").unwrap(),
            UnavailabilityReason::PermissionDenied,
        ),
        (
            Regex::new(r"(?i)not logged in|unauthorized|authentication required|no api key").unwrap(),
            UnavailabilityReason::AuthRequired,
        ),
        (
            Regex::new(r"(?i)token expired|session expired").unwrap(),
            UnavailabilityReason::AuthExpired,
        ),
        (
            Regex::new(r"(?i)config (file )?not found|missing config").unwrap(),
            UnavailabilityReason::ConfigMissing,
        ),
        (
            Regex::new(r"(?i)econnrefused|enotfound|unreachable").unwrap(),
            UnavailabilityReason::McpUnreachable,
        ),
        (
            Regex::new(r"(?i)segmentation fault|core dumped|out of memory|fatal error").unwrap(),
            UnavailabilityReason::Crash,
        ),
    ]
});

static AUTH_ERROR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"not logged in",
        r"not authenticated",
        r"no api key",
        r"unauthorized",
        r"authentication required",
        r"token expired",
        r"invalid.*token",
        r"credentials.*not found",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// Classification input: raw stderr text and the process exit code, if any.
#[derive(Debug, Clone, Default)]
pub struct ClassificationInput<'a> {
    pub stderr: Option<&'a str>,
    pub exit_code: Option<i32>,
}

/// Stderr signal dominates exit code (SPEC_FULL.md §4.D, §8).
pub fn classify_unavailability(input: &ClassificationInput<'_>) -> UnavailabilityReason {
    if let Some(stderr) = input.stderr {
        for (pattern, reason) in STDERR_PATTERNS.iter() {
            if pattern.is_match(stderr) {
                return *reason;
            }
        }
    }
    match input.exit_code {
        Some(126) => UnavailabilityReason::PermissionDenied,
        Some(127) => UnavailabilityReason::NotInstalled,
        Some(139) => UnavailabilityReason::Crash,
        _ => UnavailabilityReason::Unknown,
    }
}

/// Scans combined stdout/stderr for an auth failure phrase. Returns the
/// matched phrase (not the raw regex) if present.
pub fn detect_auth_error(combined_output: &str) -> Option<String> {
    for pattern in AUTH_ERROR_PATTERNS.iter() {
        if let Some(m) = pattern.find(combined_output) {
            return Some(m.as_str().to_string());
        }
    }
    None
}

/// Parses the first version-looking token from combined output, falling
/// back to the first 50 characters when nothing matches.
pub fn parse_version(combined_output: &str) -> String {
    if let Some(m) = VERSION_RE.find(combined_output) {
        m.as_str().to_string()
    } else {
        combined_output.chars().take(50).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_wins_over_exit_code() {
        let input = ClassificationInput {
            stderr: Some("Permission denied"),
            exit_code: Some(127),
        };
        assert_eq!(classify_unavailability(&input), UnavailabilityReason::PermissionDenied);
    }

    #[test]
    fn exit_code_fallback_table() {
        assert_eq!(
            classify_unavailability(&ClassificationInput {
                stderr: None,
                exit_code: Some(126)
            }),
            UnavailabilityReason::PermissionDenied
        );
        assert_eq!(
            classify_unavailability(&ClassificationInput {
                stderr: None,
                exit_code: Some(127)
            }),
            UnavailabilityReason::NotInstalled
        );
        assert_eq!(
            classify_unavailability(&ClassificationInput {
                stderr: None,
                exit_code: Some(139)
            }),
            UnavailabilityReason::Crash
        );
        assert_eq!(
            classify_unavailability(&ClassificationInput {
                stderr: None,
                exit_code: Some(1)
            }),
            UnavailabilityReason::Unknown
        );
    }

    #[test]
    fn mcp_unreachable_pattern() {
        let input = ClassificationInput {
            stderr: Some("Error: connect ECONNREFUSED 127.0.0.1:9999"),
            exit_code: Some(1),
        };
        assert_eq!(classify_unavailability(&input), UnavailabilityReason::McpUnreachable);
    }

    #[test]
    fn auth_error_phrase_is_extracted() {
        let found = detect_auth_error("Error: Not logged in. Run `gh auth login`.");
        assert_eq!(found, Some("Not logged in".to_string()));
    }

    #[test]
    fn version_parses_semver_from_noisy_output() {
        assert_eq!(parse_version("claude-code version v1.2.3-beta.1 (build 99)"), "v1.2.3-beta.1");
        assert_eq!(parse_version("claude 2.10"), "2.10");
    }

    #[test]
    fn version_falls_back_to_first_50_chars() {
        let out = "no version info here at all, just plain free text output from the tool";
        assert_eq!(parse_version(out), out.chars().take(50).collect::<String>());
    }
}
