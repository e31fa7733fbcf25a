//! Snapshot Aggregator: parallel, timeout-bounded, partially-failing
//! collection of NTM/beads/tools/Agent-Mail state into a single cached
//! view (SPEC_FULL.md §4.G). Each collector runs as an independent task
//! wrapped in `tokio::time::timeout` — the direct generalization of the
//! donor's `csa-resource::MemoryMonitor` spawn-a-background-task pattern.
//! A timed-out collector resolves to a structured failure rather than
//! aborting the others; subprocess cleanup on timeout is guaranteed by
//! `kill_on_drop(true)` on every spawned `Command` (see `ntm.rs`/`beads.rs`),
//! so dropping a timed-out future cannot leak a child process.

use crate::agent_mail::collect_agent_mail;
use crate::beads::{BeadsRaw, BeadsSource};
use crate::ntm::{NtmRaw, NtmSource};
use crate::tools::collect_tool_health;
use crate::types::{
    AgentMailSnapshot, BeadsSnapshot, CollectionResult, ComponentStatus, HealthSummary, NtmSnapshot, OverallStatus,
    SnapshotMeta, SystemSnapshot, ToolHealthSnapshot, SNAPSHOT_SCHEMA_VERSION,
};
use acfs_probe::DetectionCache;
use acfs_registry::types::ToolRegistry;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub cache_ttl_ms: u64,
    pub collection_timeout_ms: u64,
    pub cwd: PathBuf,
    /// Subfolder of `cwd` holding `agents.jsonl`/`messages.jsonl`.
    pub mail_subdir: PathBuf,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 10_000,
            collection_timeout_ms: 2_500,
            cwd: PathBuf::from("."),
            mail_subdir: PathBuf::from(".agent-mail"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry {
    snapshot: SystemSnapshot,
    fetched_at: Instant,
}

pub struct SnapshotAggregator {
    config: AggregatorConfig,
    registry: Arc<ToolRegistry>,
    detection_cache: Arc<DetectionCache>,
    ntm_source: Arc<dyn NtmSource>,
    beads_source: Arc<dyn BeadsSource>,
    cache: Mutex<Option<CacheEntry>>,
    stats: Mutex<CacheStats>,
}

impl SnapshotAggregator {
    pub fn new(
        config: AggregatorConfig,
        registry: Arc<ToolRegistry>,
        detection_cache: Arc<DetectionCache>,
        ntm_source: Arc<dyn NtmSource>,
        beads_source: Arc<dyn BeadsSource>,
    ) -> Self {
        Self {
            config,
            registry,
            detection_cache,
            ntm_source,
            beads_source,
            cache: Mutex::new(None),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn clear_cache(&self) {
        *self.cache.lock() = None;
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Returns the cached snapshot if still fresh, else collects a new one
    /// from all four sources in parallel.
    pub async fn get_snapshot(&self, bypass_cache: bool) -> SystemSnapshot {
        if !bypass_cache {
            if let Some(entry) = self.cache.lock().as_ref() {
                if entry.fetched_at.elapsed() < Duration::from_millis(self.config.cache_ttl_ms) {
                    self.stats.lock().hits += 1;
                    return entry.snapshot.clone();
                }
            }
        }
        self.stats.lock().misses += 1;

        let start = Instant::now();
        let timeout = Duration::from_millis(self.config.collection_timeout_ms);

        let ntm_fut = self.collect_ntm(timeout);
        let beads_fut = self.collect_beads(timeout);
        let tools_fut = self.collect_tools(timeout);
        let mail_fut = self.collect_mail(timeout);

        let (ntm, beads, tools, mail) = tokio::join!(ntm_fut, beads_fut, tools_fut, mail_fut);

        record_metric("ntm", &ntm);
        record_metric("beads", &beads);
        record_metric("tools", &tools);
        record_metric("agent_mail", &mail);

        let summary = build_summary(&ntm, &beads, &tools, &mail);

        let snapshot = SystemSnapshot {
            meta: SnapshotMeta {
                schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
                generated_at: Utc::now(),
                generation_duration_ms: start.elapsed().as_millis() as u64,
            },
            summary,
            ntm: ntm.value,
            beads: beads.value,
            tools: tools.value,
            agent_mail: mail.value,
        };

        *self.cache.lock() = Some(CacheEntry {
            snapshot: snapshot.clone(),
            fetched_at: Instant::now(),
        });

        snapshot
    }

    async fn collect_ntm(&self, timeout: Duration) -> CollectionResult<NtmSnapshot> {
        let start = Instant::now();
        let source = self.ntm_source.clone();
        match tokio::time::timeout(timeout, async move { source.collect().await }).await {
            Ok(Ok(raw)) => CollectionResult::ok(fold_ntm(raw, true), start.elapsed().as_millis() as u64),
            Ok(Err(e)) => CollectionResult::failed(fold_ntm(NtmRaw::default(), false), e.to_string(), start.elapsed().as_millis() as u64),
            Err(_) => CollectionResult::failed(
                fold_ntm(NtmRaw::default(), false),
                "ntm collection timed out",
                start.elapsed().as_millis() as u64,
            ),
        }
    }

    async fn collect_beads(&self, timeout: Duration) -> CollectionResult<BeadsSnapshot> {
        let start = Instant::now();
        let source = self.beads_source.clone();
        match tokio::time::timeout(timeout, async move { source.collect().await }).await {
            Ok(Ok(raw)) => CollectionResult::ok(fold_beads(raw), start.elapsed().as_millis() as u64),
            Ok(Err(e)) => CollectionResult::failed(BeadsSnapshot::default(), e.to_string(), start.elapsed().as_millis() as u64),
            Err(_) => CollectionResult::failed(
                BeadsSnapshot::default(),
                "beads collection timed out",
                start.elapsed().as_millis() as u64,
            ),
        }
    }

    async fn collect_tools(&self, timeout: Duration) -> CollectionResult<ToolHealthSnapshot> {
        let start = Instant::now();
        let registry = self.registry.clone();
        let cache = self.detection_cache.clone();
        let probe_timeout = timeout;
        let fut = async move { collect_tool_health(&registry.tools, &cache, probe_timeout).await };
        match tokio::time::timeout(timeout, fut).await {
            Ok(snapshot) => CollectionResult::ok(snapshot, start.elapsed().as_millis() as u64),
            Err(_) => CollectionResult::failed(
                ToolHealthSnapshot::default(),
                "tool health collection timed out",
                start.elapsed().as_millis() as u64,
            ),
        }
    }

    async fn collect_mail(&self, timeout: Duration) -> CollectionResult<AgentMailSnapshot> {
        let start = Instant::now();
        let mail_dir = self.config.cwd.join(&self.config.mail_subdir);
        let fut = tokio::task::spawn_blocking(move || collect_agent_mail(&mail_dir));
        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(snapshot)) => CollectionResult::ok(snapshot, start.elapsed().as_millis() as u64),
            Ok(Err(e)) => CollectionResult::failed(AgentMailSnapshot::default(), e.to_string(), start.elapsed().as_millis() as u64),
            Err(_) => CollectionResult::failed(
                AgentMailSnapshot::default(),
                "agent mail collection timed out",
                start.elapsed().as_millis() as u64,
            ),
        }
    }
}

fn fold_ntm(raw: NtmRaw, success: bool) -> NtmSnapshot {
    NtmSnapshot {
        available: success,
        sessions: raw.sessions,
        captured_at: if success { Some(Utc::now()) } else { None },
    }
}

fn fold_beads(raw: BeadsRaw) -> BeadsSnapshot {
    BeadsSnapshot {
        br_available: raw.br_available,
        bv_available: raw.bv_available,
        triage_count: raw.triage_count,
        sync_pending: raw.sync_pending,
        captured_at: Some(Utc::now()),
    }
}

fn record_metric<T>(source: &'static str, result: &CollectionResult<T>) {
    metrics::histogram!("acfs_snapshot_collection_latency_ms", "source" => source).record(result.latency_ms as f64);
    metrics::counter!("acfs_snapshot_collection_total", "source" => source, "success" => result.success.to_string())
        .increment(1);
    if !result.success {
        tracing::debug!(source, error = result.error.as_deref().unwrap_or(""), "snapshot source failed");
    }
}

/// Health summary derivation (SPEC_FULL.md §4.G, §8):
/// - NTM: success && available ⇒ healthy; success && !available ⇒ unhealthy; else unknown.
/// - Beads: success && (br||bv) ⇒ healthy; success && neither ⇒ unhealthy; else unknown.
/// - Tools: carries its own status; else unknown.
/// - Agent Mail: success && available ⇒ status (healthy/degraded based on agents present);
///   success && !available ⇒ unhealthy; else unknown.
fn build_summary(
    ntm: &CollectionResult<NtmSnapshot>,
    beads: &CollectionResult<BeadsSnapshot>,
    tools: &CollectionResult<ToolHealthSnapshot>,
    mail: &CollectionResult<AgentMailSnapshot>,
) -> HealthSummary {
    let ntm_status = if ntm.success && ntm.value.available {
        ComponentStatus::Healthy
    } else if ntm.success {
        ComponentStatus::Unhealthy
    } else {
        ComponentStatus::Unknown
    };

    let beads_status = if beads.success && (beads.value.br_available || beads.value.bv_available) {
        ComponentStatus::Healthy
    } else if beads.success {
        ComponentStatus::Unhealthy
    } else {
        ComponentStatus::Unknown
    };

    let tools_status = if tools.success { tools.value.status } else { ComponentStatus::Unknown };

    let mail_status = if mail.success && mail.value.available {
        if mail.value.agent_count > 0 {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Degraded
        }
    } else if mail.success {
        ComponentStatus::Unhealthy
    } else {
        ComponentStatus::Unknown
    };

    let mut issues = Vec::new();
    if !ntm.success {
        issues.push(format!("ntm: {}", ntm.error.as_deref().unwrap_or("unknown failure")));
    }
    if !beads.success {
        issues.push(format!("beads: {}", beads.error.as_deref().unwrap_or("unknown failure")));
    }
    if !tools.success {
        issues.push(format!("tools: {}", tools.error.as_deref().unwrap_or("unknown failure")));
    }
    if !mail.success {
        issues.push(format!("agent_mail: {}", mail.error.as_deref().unwrap_or("unknown failure")));
    }

    let status = crate::types::fold_statuses(&[ntm_status, beads_status, tools_status, mail_status]);
    let status = match status {
        OverallStatus::Healthy => OverallStatus::Healthy,
        OverallStatus::Degraded => OverallStatus::Degraded,
        OverallStatus::Unhealthy => OverallStatus::Unhealthy,
    };

    HealthSummary {
        status,
        ntm: ntm_status,
        beads: beads_status,
        tools: tools_status,
        agent_mail: mail_status,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beads::BeadsError;
    use crate::ntm::NtmError;
    use acfs_registry::fallback_registry;
    use async_trait::async_trait;

    struct AlwaysFailsNtm;
    #[async_trait]
    impl NtmSource for AlwaysFailsNtm {
        async fn collect(&self) -> Result<NtmRaw, NtmError> {
            Err(NtmError::NotInstalled)
        }
    }

    struct AlwaysFailsBeads;
    #[async_trait]
    impl BeadsSource for AlwaysFailsBeads {
        async fn collect(&self) -> Result<BeadsRaw, BeadsError> {
            Err(BeadsError::NeitherInstalled)
        }
    }

    struct HangsForever;
    #[async_trait]
    impl NtmSource for HangsForever {
        async fn collect(&self) -> Result<NtmRaw, NtmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(NtmRaw::default())
        }
    }

    fn aggregator(cwd: PathBuf, ntm: Arc<dyn NtmSource>, beads: Arc<dyn BeadsSource>) -> SnapshotAggregator {
        SnapshotAggregator::new(
            AggregatorConfig {
                cache_ttl_ms: 10_000,
                collection_timeout_ms: 100,
                cwd,
                mail_subdir: PathBuf::from(".agent-mail"),
            },
            Arc::new(fallback_registry()),
            Arc::new(DetectionCache::new(Duration::from_secs(60), Duration::from_millis(50))),
            ntm,
            beads,
        )
    }

    #[tokio::test]
    async fn all_sources_failing_yields_degraded_or_unhealthy_with_empty_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let agg = aggregator(dir.path().to_path_buf(), Arc::new(AlwaysFailsNtm), Arc::new(AlwaysFailsBeads));
        let snapshot = agg.get_snapshot(true).await;
        assert!(matches!(snapshot.summary.status, OverallStatus::Degraded | OverallStatus::Unhealthy));
        assert!(!snapshot.ntm.available);
        assert!(!snapshot.agent_mail.available);
        assert!(!snapshot.summary.issues.is_empty());
    }

    #[tokio::test]
    async fn a_hanging_collector_times_out_without_blocking_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let agg = aggregator(dir.path().to_path_buf(), Arc::new(HangsForever), Arc::new(AlwaysFailsBeads));
        let start = Instant::now();
        let snapshot = agg.get_snapshot(true).await;
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!snapshot.ntm.available);
    }

    #[tokio::test]
    async fn cache_hit_avoids_recollection() {
        let dir = tempfile::tempdir().unwrap();
        let agg = aggregator(dir.path().to_path_buf(), Arc::new(AlwaysFailsNtm), Arc::new(AlwaysFailsBeads));
        let first = agg.get_snapshot(false).await;
        let second = agg.get_snapshot(false).await;
        assert_eq!(first.meta.generated_at, second.meta.generated_at);
        assert_eq!(agg.cache_stats().hits, 1);

        agg.clear_cache();
        let third = agg.get_snapshot(false).await;
        assert!(third.meta.generated_at >= first.meta.generated_at);
    }
}
