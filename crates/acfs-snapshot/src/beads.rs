//! Beads (`br`/`bv`) collector. Both are external issue-tracking CLIs
//! (out of scope per SPEC_FULL.md §1); this module defines the interface
//! the aggregator collects through and a process-spawning default.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Default)]
pub struct BeadsRaw {
    pub br_available: bool,
    pub bv_available: bool,
    pub triage_count: u32,
    pub sync_pending: u32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BeadsError {
    #[error("neither br nor bv is installed")]
    NeitherInstalled,
    #[error("failed to parse beads output: {0}")]
    ParseError(String),
}

#[async_trait]
pub trait BeadsSource: Send + Sync {
    async fn collect(&self) -> Result<BeadsRaw, BeadsError>;
}

#[derive(Debug, Deserialize, Default)]
struct BvTriage {
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize, Default)]
struct BrSync {
    #[serde(default)]
    pending: u32,
}

/// Shells out to `bv triage --json` and `br sync --status --json`
/// independently; either one succeeding is enough to report availability.
pub struct CommandBeadsSource;

async fn run_json<T: for<'de> Deserialize<'de> + Default>(binary: &str, args: &[&str]) -> Option<T> {
    if which::which(binary).is_err() {
        return None;
    }
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    serde_json::from_slice(&output.stdout).ok()
}

#[async_trait]
impl BeadsSource for CommandBeadsSource {
    async fn collect(&self) -> Result<BeadsRaw, BeadsError> {
        let bv = run_json::<BvTriage>("bv", &["triage", "--json"]).await;
        let br = run_json::<BrSync>("br", &["sync", "--status", "--json"]).await;

        if bv.is_none() && which::which("bv").is_err() && br.is_none() && which::which("br").is_err() {
            return Err(BeadsError::NeitherInstalled);
        }

        Ok(BeadsRaw {
            br_available: which::which("br").is_ok(),
            bv_available: which::which("bv").is_ok(),
            triage_count: bv.unwrap_or_default().count,
            sync_pending: br.unwrap_or_default().pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn neither_installed_is_an_error() {
        // In the sandboxed test environment neither br nor bv should be on PATH.
        let source = CommandBeadsSource;
        let result = source.collect().await;
        if which::which("br").is_err() && which::which("bv").is_err() {
            assert!(matches!(result, Err(BeadsError::NeitherInstalled)));
        }
    }
}
