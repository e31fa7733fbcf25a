//! TTL-cached detection results, mirroring the registry loader's cache
//! so a dashboard re-render doesn't re-spawn every CLI on every poll.

use crate::probe::probe_cli;
use crate::types::{CliDefinition, DetectedCli, DetectionSnapshot};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    detected: DetectedCli,
    cached_at: Instant,
}

/// Caches per-CLI detection results for `ttl`, keyed by CLI name.
pub struct DetectionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    probe_timeout: Duration,
}

impl DetectionCache {
    pub fn new(ttl: Duration, probe_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            probe_timeout,
        }
    }

    /// Returns a cached detection if still fresh, else probes and caches.
    pub async fn detect(&self, def: &CliDefinition) -> DetectedCli {
        if let Some(hit) = self.fresh_hit(&def.name) {
            return hit;
        }
        let detected = probe_cli(def, self.probe_timeout).await;
        self.entries.write().insert(
            def.name.clone(),
            CacheEntry {
                detected: detected.clone(),
                cached_at: Instant::now(),
            },
        );
        detected
    }

    fn fresh_hit(&self, name: &str) -> Option<DetectedCli> {
        let entries = self.entries.read();
        let entry = entries.get(name)?;
        if entry.cached_at.elapsed() < self.ttl {
            Some(entry.detected.clone())
        } else {
            None
        }
    }

    /// Forces a re-probe on the next `detect()` call for every cached CLI.
    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    /// Forces a re-probe on the next `detect()` call for one CLI.
    pub fn invalidate(&self, name: &str) {
        self.entries.write().remove(name);
    }

    /// Detects every agent and tool definition, building the aggregate
    /// snapshot. Each definition's cache slot is independent, so callers
    /// that want wall-clock concurrency can run several `detect` calls
    /// under their own `tokio::join!`/`JoinSet`; this helper favors a
    /// simple, predictable ordering for the common dashboard-poll case.
    pub async fn detect_all(&self, agents: &[CliDefinition], tools: &[CliDefinition]) -> DetectionSnapshot {
        let mut agent_results = Vec::with_capacity(agents.len());
        for def in agents {
            agent_results.push(self.detect(def).await);
        }
        let mut tool_results = Vec::with_capacity(tools.len());
        for def in tools {
            tool_results.push(self.detect(def).await);
        }
        DetectionSnapshot::new(agent_results, tool_results)
    }
}
