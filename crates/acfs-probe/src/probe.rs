//! Detects an installed CLI, parses its version, and classifies why it's
//! unavailable when it can't be used (SPEC_FULL.md §4.D, §5).

use crate::classify::{classify_unavailability, detect_auth_error, parse_version, ClassificationInput};
use crate::types::{Capabilities, CliDefinition, DetectedCli};
use acfs_core::UnavailabilityReason;
use chrono::Utc;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Probes a single CLI definition. Never panics or propagates a raw
/// exception past this boundary — every failure mode resolves to a
/// `DetectedCli` with `available: false` and a populated reason.
pub async fn probe_cli(def: &CliDefinition, timeout: Duration) -> DetectedCli {
    let start = Instant::now();

    let resolved = match which::which(&def.name) {
        Ok(path) => path,
        Err(_) => {
            return finish(def, DetectedCli::unavailable(&def.name, UnavailabilityReason::NotInstalled, elapsed_ms(start)));
        }
    };

    let mut args = def.commands.clone();
    args.push(def.version_flag.clone());

    let spawn_result = Command::new(&resolved)
        .args(&args)
        .env("NO_COLOR", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match spawn_result {
        Ok(child) => child,
        Err(_) => {
            return finish(
                def,
                DetectedCli::unavailable(&def.name, UnavailabilityReason::SpawnFailed, elapsed_ms(start)),
            );
        }
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(_)) => {
            return finish(
                def,
                DetectedCli::unavailable(&def.name, UnavailabilityReason::SpawnFailed, elapsed_ms(start)),
            );
        }
        Err(_) => {
            return finish(
                def,
                DetectedCli::unavailable(&def.name, UnavailabilityReason::Timeout, elapsed_ms(start)),
            );
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let combined = format!("{stdout}\n{stderr}");
    let exit_code = output.status.code();

    let mut detected = if exit_code == Some(0) {
        DetectedCli {
            name: def.name.clone(),
            available: true,
            path: Some(resolved.display().to_string()),
            version: Some(parse_version(&combined)),
            authenticated: None,
            auth_error: None,
            unavailability_reason: None,
            capabilities: def.capabilities,
            detected_at: Utc::now(),
            duration_ms: elapsed_ms(start),
        }
    } else {
        let reason = classify_unavailability(&ClassificationInput {
            stderr: Some(&stderr),
            exit_code,
        });
        DetectedCli::unavailable(&def.name, reason, elapsed_ms(start))
    };
    detected.path = detected.path.or_else(|| Some(resolved.display().to_string()));

    if let Some(phrase) = detect_auth_error(&combined.to_lowercase()) {
        detected.authenticated = Some(false);
        detected.auth_error = Some(phrase);
    } else if let Some(auth_check_cmd) = &def.auth_check_cmd {
        detected.authenticated = Some(run_auth_check(auth_check_cmd, &resolved, timeout).await);
    }

    finish(def, detected)
}

fn finish(_def: &CliDefinition, detected: DetectedCli) -> DetectedCli {
    detected
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

async fn run_auth_check(auth_check_cmd: &[String], resolved_path: &std::path::Path, timeout: Duration) -> bool {
    if auth_check_cmd.is_empty() {
        return false;
    }
    let args = &auth_check_cmd[1..];
    let spawn_result = Command::new(resolved_path)
        .args(args)
        .env("NO_COLOR", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let Ok(child) = spawn_result else {
        return false;
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output.status.success(),
        _ => false,
    }
}

/// Default, empty capability set for tools whose manifest entry doesn't
/// describe capabilities.
pub fn no_capabilities() -> Capabilities {
    Capabilities::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str) -> CliDefinition {
        CliDefinition {
            name: name.to_string(),
            commands: vec![],
            version_flag: "--version".to_string(),
            auth_check_cmd: None,
            capabilities: Capabilities::default(),
        }
    }

    #[tokio::test]
    async fn probing_a_nonexistent_binary_yields_not_installed() {
        let detected = probe_cli(&def("definitely-not-a-real-cli-binary-xyz"), Duration::from_millis(500)).await;
        assert!(!detected.available);
        assert_eq!(detected.unavailability_reason, Some(UnavailabilityReason::NotInstalled));
    }

    #[tokio::test]
    async fn probing_true_reports_available() {
        // `true` exits 0 with no output; version falls back to empty string.
        let detected = probe_cli(&def("true"), Duration::from_millis(1000)).await;
        assert!(detected.available);
        assert!(detected.path.is_some());
    }

    #[tokio::test]
    async fn probing_false_reports_unavailable_unknown() {
        let detected = probe_cli(&def("false"), Duration::from_millis(1000)).await;
        assert!(!detected.available);
        assert_eq!(detected.unavailability_reason, Some(UnavailabilityReason::Unknown));
    }
}
