//! Dependency-aware health diagnostics: root-cause derivation over a tool
//! dependency graph with stderr/exit-code classification of failure
//! reasons (SPEC_FULL.md §4.E). Generalizes the donor's `csa-todo`
//! dependency-graph DFS (there: markdown TODO items with `depends:`
//! annotations; here: manifest tools with `depends: [id]`) to a different
//! node type: same adjacency-list-plus-visited-set shape.

pub mod types;

use acfs_core::UnavailabilityReason;
use acfs_probe::types::DetectedCli;
use acfs_registry::types::ToolDefinition;
use std::collections::{HashMap, HashSet};

pub use types::{DiagnosticsReport, DiagnosticsSummary, ToolHealth};

/// Looks up a detected CLI by tool `id` first, falling back to `name`
/// (manifest `id`s and probe `name`s are different namespaces that happen
/// to coincide for most tools).
fn availability_index<'a>(
    tools: &'a [ToolDefinition],
    detected: &'a [DetectedCli],
) -> HashMap<&'a str, &'a DetectedCli> {
    let by_name: HashMap<&str, &DetectedCli> =
        detected.iter().map(|d| (d.name.as_str(), d)).collect();
    let mut index = HashMap::new();
    for tool in tools {
        if let Some(found) = by_name.get(tool.id.as_str()).or_else(|| by_name.get(tool.name.as_str())) {
            index.insert(tool.id.as_str(), *found);
        }
    }
    index
}

/// Root-first path from the deepest unavailable ancestor to `tool_id`,
/// cycle-guarded via a visited set: revisiting an in-progress node returns
/// that node as the path's root instead of recursing forever.
fn root_cause_path(
    tool_id: &str,
    depends_on: &HashMap<&str, Vec<String>>,
    detected: &HashMap<&str, &DetectedCli>,
    visited: &mut HashSet<String>,
) -> Vec<String> {
    if visited.contains(tool_id) {
        return vec![tool_id.to_string()];
    }
    visited.insert(tool_id.to_string());

    let deps = depends_on.get(tool_id).cloned().unwrap_or_default();
    for dep in &deps {
        let dep_available = detected.get(dep.as_str()).map(|d| d.available).unwrap_or(true);
        if !dep_available {
            let mut upstream = root_cause_path(dep, depends_on, detected, visited);
            upstream.push(tool_id.to_string());
            return upstream;
        }
    }
    vec![tool_id.to_string()]
}

/// Builds the dependency-derived health report for every tool in the
/// registry (SPEC_FULL.md §4.E, §8).
pub fn diagnose(tools: &[ToolDefinition], detected: &[DetectedCli]) -> DiagnosticsReport {
    let index = availability_index(tools, detected);

    let depends_on: HashMap<&str, Vec<String>> = tools
        .iter()
        .map(|t| (t.id.as_str(), t.depends.clone()))
        .collect();

    let mut depended_by: HashMap<&str, Vec<String>> = HashMap::new();
    for tool in tools {
        for dep in &tool.depends {
            depended_by.entry(dep.as_str()).or_default().push(tool.id.clone());
        }
    }

    let mut report = Vec::with_capacity(tools.len());
    for tool in tools {
        let detected_cli = index.get(tool.id.as_str()).copied();
        let available = detected_cli.map(|d| d.available).unwrap_or(false);
        let depends_on_ids = tool.depends.clone();
        let depended_by_ids = depended_by.get(tool.id.as_str()).cloned().unwrap_or_default();

        if available {
            report.push(ToolHealth {
                id: tool.id.clone(),
                display_name: tool.display_name().to_string(),
                available: true,
                depends_on: depends_on_ids,
                depended_by: depended_by_ids,
                reason: None,
                reason_label: None,
                root_cause_path: vec![],
                explanation: None,
            });
            continue;
        }

        let reason = detected_cli
            .and_then(|d| d.unavailability_reason)
            .unwrap_or(UnavailabilityReason::Unknown);

        let mut visited = HashSet::new();
        let path = root_cause_path(&tool.id, &depends_on, &index, &mut visited);
        let root_id = path.first().cloned().unwrap_or_else(|| tool.id.clone());
        let root_display_name = tools
            .iter()
            .find(|t| t.id == root_id)
            .map(|t| t.display_name().to_string())
            .unwrap_or_else(|| root_id.clone());

        let explanation = format!(
            "{} is unavailable because {} is missing",
            tool.display_name(),
            root_display_name
        );

        report.push(ToolHealth {
            id: tool.id.clone(),
            display_name: tool.display_name().to_string(),
            available: false,
            depends_on: depends_on_ids,
            depended_by: depended_by_ids,
            reason: Some(reason),
            reason_label: Some(reason.label().to_string()),
            root_cause_path: path,
            explanation: Some(explanation),
        });
    }

    let available = report.iter().filter(|t| t.available).count();
    let unavailable = report.len() - available;
    let cascade_failures = report.iter().filter(|t| t.is_cascade_failure()).count();
    let mut root_cause_ids: Vec<String> = report
        .iter()
        .filter(|t| !t.available)
        .filter_map(|t| t.root_cause_id().map(str::to_string))
        .collect();
    root_cause_ids.sort();
    root_cause_ids.dedup();

    DiagnosticsReport {
        tools: report,
        summary: DiagnosticsSummary {
            total: tools.len(),
            available,
            unavailable,
            cascade_failures,
            root_cause_ids,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acfs_probe::types::Capabilities;
    use acfs_registry::types::ToolCategory;
    use chrono::Utc;

    fn tool(id: &str, depends: Vec<&str>) -> ToolDefinition {
        ToolDefinition {
            id: id.to_string(),
            name: id.to_string(),
            category: ToolCategory::Tool,
            display_name: None,
            description: None,
            tags: vec![],
            optional: None,
            enabled_by_default: None,
            phase: None,
            depends: depends.into_iter().map(String::from).collect(),
            docs_url: None,
            install: vec![],
            verified_installer: None,
            verify: None,
            installed_check: None,
            checksums: Default::default(),
            robot_mode: None,
            mcp: None,
        }
    }

    fn detected(name: &str, available: bool, reason: Option<UnavailabilityReason>) -> DetectedCli {
        DetectedCli {
            name: name.to_string(),
            available,
            path: None,
            version: None,
            authenticated: None,
            auth_error: None,
            unavailability_reason: reason,
            capabilities: Capabilities::default(),
            detected_at: Utc::now(),
            duration_ms: 0,
        }
    }

    #[test]
    fn cascade_failure_traces_to_the_missing_dependency() {
        let tools = vec![tool("tmux", vec![]), tool("ntm", vec!["tmux"])];
        let detected = vec![
            detected("tmux", false, Some(UnavailabilityReason::NotInstalled)),
            detected("ntm", false, Some(UnavailabilityReason::DependencyMissing)),
        ];
        let report = diagnose(&tools, &detected);
        let ntm = report.tools.iter().find(|t| t.id == "ntm").unwrap();
        assert!(ntm.is_cascade_failure());
        assert_eq!(ntm.root_cause_id(), Some("tmux"));
        assert_eq!(ntm.root_cause_path, vec!["tmux", "ntm"]);
        assert!(ntm.explanation.as_ref().unwrap().contains("tmux"));
        assert_eq!(report.summary.cascade_failures, 1);
    }

    #[test]
    fn available_tool_has_no_root_cause_path() {
        let tools = vec![tool("dcg", vec![])];
        let detected = vec![detected("dcg", true, None)];
        let report = diagnose(&tools, &detected);
        let dcg = &report.tools[0];
        assert!(dcg.available);
        assert!(dcg.root_cause_path.is_empty());
        assert!(!dcg.is_cascade_failure());
    }

    #[test]
    fn a_tool_unavailable_on_its_own_is_its_own_root_cause() {
        let tools = vec![tool("slb", vec![])];
        let detected = vec![detected("slb", false, Some(UnavailabilityReason::AuthRequired))];
        let report = diagnose(&tools, &detected);
        let slb = &report.tools[0];
        assert_eq!(slb.root_cause_path, vec!["slb"]);
        assert!(!slb.is_cascade_failure());
        assert_eq!(slb.reason, Some(UnavailabilityReason::AuthRequired));
    }

    #[test]
    fn cyclic_dependencies_do_not_recurse_infinitely() {
        let tools = vec![tool("a", vec!["b"]), tool("b", vec!["a"])];
        let detected = vec![
            detected("a", false, Some(UnavailabilityReason::Unknown)),
            detected("b", false, Some(UnavailabilityReason::Unknown)),
        ];
        let report = diagnose(&tools, &detected);
        assert_eq!(report.tools.len(), 2);
    }

    #[test]
    fn summary_counts_and_dedups_root_causes() {
        let tools = vec![
            tool("tmux", vec![]),
            tool("ntm", vec!["tmux"]),
            tool("ntm2", vec!["tmux"]),
            tool("dcg", vec![]),
        ];
        let detected = vec![
            detected("tmux", false, Some(UnavailabilityReason::NotInstalled)),
            detected("ntm", false, Some(UnavailabilityReason::DependencyMissing)),
            detected("ntm2", false, Some(UnavailabilityReason::DependencyMissing)),
            detected("dcg", true, None),
        ];
        let report = diagnose(&tools, &detected);
        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.available, 1);
        assert_eq!(report.summary.unavailable, 3);
        assert_eq!(report.summary.root_cause_ids, vec!["tmux".to_string()]);
    }
}
