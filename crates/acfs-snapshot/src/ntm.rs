//! NTM (external session/agent status provider) collector. NTM itself is
//! out of scope (SPEC_FULL.md §1); this module only defines the interface
//! the aggregator collects through and a process-spawning default that
//! shells out to the `ntm` CLI the same way `acfs-probe` shells out to
//! other tool binaries.

use crate::types::NtmSessionInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

/// Raw collector output before it's folded into [`crate::types::NtmSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct NtmRaw {
    pub sessions: Vec<NtmSessionInfo>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NtmError {
    #[error("ntm binary not found on PATH")]
    NotInstalled,
    #[error("ntm exited with status {0}")]
    NonZeroExit(i32),
    #[error("failed to parse ntm output: {0}")]
    ParseError(String),
    #[error("failed to spawn ntm: {0}")]
    SpawnFailed(String),
}

/// Abstraction over the external NTM status source so the aggregator can
/// be driven by a live process, a long-lived RPC client, or a test double.
#[async_trait]
pub trait NtmSource: Send + Sync {
    async fn collect(&self) -> Result<NtmRaw, NtmError>;
}

/// Mirrors the shape of `ntm list --json`.
#[derive(Debug, Deserialize)]
struct NtmCliSession {
    id: String,
    label: String,
    active: bool,
}

/// Shells out to `ntm list --json`, the conventional machine-readable
/// listing format this collector expects from the external binary.
pub struct CommandNtmSource {
    pub binary: String,
}

impl Default for CommandNtmSource {
    fn default() -> Self {
        Self { binary: "ntm".to_string() }
    }
}

#[async_trait]
impl NtmSource for CommandNtmSource {
    async fn collect(&self) -> Result<NtmRaw, NtmError> {
        if which::which(&self.binary).is_err() {
            return Err(NtmError::NotInstalled);
        }
        let output = Command::new(&self.binary)
            .args(["list", "--json"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| NtmError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(NtmError::NonZeroExit(output.status.code().unwrap_or(-1)));
        }

        let sessions: Vec<NtmCliSession> = serde_json::from_slice(&output.stdout)
            .map_err(|e| NtmError::ParseError(e.to_string()))?;

        Ok(NtmRaw {
            sessions: sessions
                .into_iter()
                .map(|s| NtmSessionInfo {
                    id: s.id,
                    label: s.label,
                    active: s.active,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_reports_not_installed() {
        let source = CommandNtmSource {
            binary: "definitely-not-a-real-ntm-binary-xyz".to_string(),
        };
        let err = source.collect().await.unwrap_err();
        assert!(matches!(err, NtmError::NotInstalled));
    }
}
