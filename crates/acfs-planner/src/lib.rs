//! Install Planner: diffs the tool registry against detection results to
//! synthesize a phased install plan and remediation guidance
//! (SPEC_FULL.md §4.F). Generalizes the donor's `weave::package`
//! install/lock/audit machinery — there: git-based skill package installs
//! with a lockfile; here: per-tool install command resolution assembled
//! into a phase-ordered bash script — same "resolve a command, emit
//! remediation steps, assemble a script" shape.

pub mod types;

use acfs_registry::classify::{classify, Classification};
use acfs_registry::types::ToolDefinition;
use chrono::Utc;
use std::collections::HashMap;

pub use types::{DetectedTool, InstallPlan, PlanStatus, ToolPlanEntry};

/// `verifiedInstaller` (`runner + args.join(" ")`) takes precedence over
/// `install[0]` (`command + args.join(" ")`); `None` if neither is present.
fn install_command(tool: &ToolDefinition) -> Option<String> {
    if let Some(installer) = &tool.verified_installer {
        let mut parts = vec![installer.runner.clone()];
        parts.extend(installer.args.iter().cloned());
        return Some(parts.join(" "));
    }
    if let Some(first) = tool.install.first() {
        let mut parts = vec![first.command.clone()];
        parts.extend(first.args.iter().cloned());
        return Some(parts.join(" "));
    }
    None
}

fn manual_url(tool: &ToolDefinition) -> Option<&str> {
    tool.verified_installer
        .as_ref()
        .and_then(|i| i.fallback_url.as_deref())
        .or_else(|| tool.install.first().and_then(|i| i.url.as_deref()))
}

/// Ordered, de-empty remediation steps (SPEC_FULL.md §4.F).
fn remediation(tool: &ToolDefinition, command: &Option<String>) -> Vec<String> {
    let mut steps = Vec::new();

    if let Some(cmd) = command {
        steps.push(format!("Install: `{cmd}`"));
    }
    if let Some(url) = manual_url(tool) {
        steps.push(format!("Manual: {url}"));
    }
    if let Some(docs) = &tool.docs_url {
        steps.push(format!("Docs: {docs}"));
    }
    if let Some(verify) = &tool.verify {
        if !verify.command.is_empty() {
            steps.push(format!("Verify: `{}`", verify.command.join(" ")));
        }
    }
    if let Some(first) = tool.install.first() {
        if first.requires_sudo {
            steps.push("requires sudo".to_string());
        }
        if first.mode.as_deref() == Some("interactive") {
            steps.push("interactive install (may need tmux)".to_string());
        }
    }

    if steps.is_empty() {
        steps.push("See documentation for installation instructions.".to_string());
    }
    steps
}

fn resolve_status(detected: Option<&DetectedTool>, required: bool) -> PlanStatus {
    match detected {
        Some(d) if d.available => PlanStatus::Installed,
        Some(d) if d.error.is_some() => PlanStatus::Error,
        _ if required => PlanStatus::Missing,
        _ => PlanStatus::OptionalMissing,
    }
}

/// Builds the install plan: entries sorted by `phase` ascending (registry
/// order within a phase, default bucket 999), counts, readiness, and the
/// phase-ordered install script (SPEC_FULL.md §8 scenario 3).
pub fn plan(tools: &[ToolDefinition], detected: &[DetectedTool]) -> InstallPlan {
    let by_name: HashMap<&str, &DetectedTool> = detected.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut indexed: Vec<(usize, &ToolDefinition)> = tools.iter().enumerate().collect();
    indexed.sort_by_key(|(idx, t)| (t.phase_or_default(), *idx));

    let mut entries = Vec::with_capacity(tools.len());
    let mut installed = 0usize;
    let mut missing_required = 0usize;
    let mut missing_optional = 0usize;

    for (_, tool) in &indexed {
        let required = classify(tool) == Classification::Required;
        let found = by_name.get(tool.name.as_str()).copied();
        let status = resolve_status(found, required);
        let command = install_command(tool);

        match status {
            PlanStatus::Installed => installed += 1,
            PlanStatus::Error if required => missing_required += 1,
            PlanStatus::Missing => missing_required += 1,
            PlanStatus::OptionalMissing => missing_optional += 1,
            PlanStatus::Error => {}
        }

        entries.push(ToolPlanEntry {
            id: tool.id.clone(),
            name: tool.name.clone(),
            display_name: tool.display_name().to_string(),
            phase: tool.phase_or_default(),
            status,
            required,
            install_command: command.clone(),
            docs_url: tool.docs_url.clone(),
            remediation: remediation(tool, &command),
            version: found.and_then(|d| d.version.clone()),
        });
    }

    let install_script = build_install_script(tools, &entries);
    let ready = missing_required == 0;

    InstallPlan {
        entries,
        installed,
        missing_required,
        missing_optional,
        ready,
        install_script,
        computed_at: Utc::now(),
    }
}

/// Phase-ordered lines for every missing-required tool with a resolved
/// install command. Optional-missing tools never appear here.
fn build_install_script(tools: &[ToolDefinition], entries: &[ToolPlanEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in entries {
        if entry.status != PlanStatus::Missing || !entry.required {
            continue;
        }
        let Some(cmd) = &entry.install_command else {
            continue;
        };
        let _ = tools;
        lines.push(format!("# {} (phase {})", entry.display_name, entry.phase));
        lines.push(cmd.clone());
    }
    lines
}

/// Wraps [`build_install_script`]'s lines in a runnable bash script:
/// shebang + `set -euo pipefail` + body + completion echo. If there is
/// nothing to install, emits a single success comment instead.
pub fn format_install_script(plan: &InstallPlan) -> String {
    if plan.install_script.is_empty() {
        return "#!/usr/bin/env bash\n# All required tools are already installed.\n".to_string();
    }
    let mut out = String::from("#!/usr/bin/env bash\nset -euo pipefail\n\n");
    out.push_str(&plan.install_script.join("\n"));
    out.push_str("\n\necho \"Install plan complete.\"\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use acfs_registry::types::{InstallSpec, ToolCategory, VerifiedInstaller, VerifySpec};

    fn required_tool(id: &str, phase: i64, cmd: &str) -> ToolDefinition {
        ToolDefinition {
            id: id.to_string(),
            name: id.to_string(),
            category: ToolCategory::Tool,
            display_name: None,
            description: None,
            tags: vec!["critical".to_string()],
            optional: Some(false),
            enabled_by_default: Some(true),
            phase: Some(phase),
            depends: vec![],
            docs_url: Some("https://example.com/docs".to_string()),
            install: vec![InstallSpec {
                command: cmd.to_string(),
                args: vec![],
                url: Some("https://example.com/install".to_string()),
                requires_sudo: false,
                mode: None,
            }],
            verified_installer: None,
            verify: Some(VerifySpec {
                command: vec![cmd.to_string(), "--version".to_string()],
                expected_exit_codes: vec![0],
                min_version: None,
                version_regex: None,
                timeout_ms: None,
            }),
            installed_check: None,
            checksums: Default::default(),
            robot_mode: None,
            mcp: None,
        }
    }

    fn optional_tool(id: &str) -> ToolDefinition {
        ToolDefinition {
            id: id.to_string(),
            name: id.to_string(),
            category: ToolCategory::Tool,
            display_name: None,
            description: None,
            tags: vec![],
            optional: Some(true),
            enabled_by_default: Some(false),
            phase: None,
            depends: vec![],
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

    #[test]
    fn install_plan_diff_matches_scenario_3() {
        let mut slb = required_tool("slb", 0, "cargo install slb");
        slb.tags = vec!["critical".to_string()];
        let tools = vec![
            required_tool("dcg", 0, "cargo install dcg"),
            slb,
            {
                let mut bv = optional_tool("bv");
                bv.enabled_by_default = Some(true);
                bv
            },
            optional_tool("cass"),
        ];
        let detected = vec![
            DetectedTool {
                name: "slb".into(),
                available: true,
                version: Some("1.0".into()),
                error: None,
            },
            DetectedTool {
                name: "bv".into(),
                available: true,
                version: None,
                error: None,
            },
        ];

        let install_plan = plan(&tools, &detected);
        assert!(!install_plan.ready);
        assert_eq!(install_plan.missing_required, 1);
        assert_eq!(install_plan.missing_optional, 1);
        assert!(install_plan.install_script.iter().any(|l| l.contains("cargo install dcg")));
        assert!(!install_plan.install_script.iter().any(|l| l.contains("cass")));
    }

    #[test]
    fn ready_iff_no_missing_required_entries() {
        let tools = vec![required_tool("dcg", 0, "cargo install dcg")];
        let detected = vec![DetectedTool {
            name: "dcg".into(),
            available: true,
            version: None,
            error: None,
        }];
        assert!(plan(&tools, &detected).ready);

        let detected_missing = vec![];
        assert!(!plan(&tools, &detected_missing).ready);
    }

    #[test]
    fn remediation_steps_are_ordered_and_include_sudo_note() {
        let mut tool = required_tool("dcg", 0, "cargo install dcg");
        tool.install[0].requires_sudo = true;
        tool.install[0].mode = Some("interactive".to_string());
        let cmd = install_command(&tool);
        let steps = remediation(&tool, &cmd);
        assert_eq!(steps[0], "Install: `cargo install dcg`");
        assert!(steps.contains(&"requires sudo".to_string()));
        assert!(steps.contains(&"interactive install (may need tmux)".to_string()));
    }

    #[test]
    fn verified_installer_takes_precedence_over_install_list() {
        let mut tool = required_tool("dcg", 0, "cargo install dcg");
        tool.verified_installer = Some(VerifiedInstaller {
            runner: "brew".to_string(),
            args: vec!["install".to_string(), "dcg".to_string()],
            fallback_url: Some("https://brew.sh".to_string()),
        });
        assert_eq!(install_command(&tool), Some("brew install dcg".to_string()));
    }

    #[test]
    fn format_install_script_wraps_with_shebang_and_completion() {
        let tools = vec![required_tool("dcg", 0, "cargo install dcg")];
        let install_plan = plan(&tools, &[]);
        let script = format_install_script(&install_plan);
        assert!(script.starts_with("#!/usr/bin/env bash\nset -euo pipefail"));
        assert!(script.contains("cargo install dcg"));
        assert!(script.trim_end().ends_with("Install plan complete.\""));
    }

    #[test]
    fn format_install_script_emits_success_comment_when_nothing_missing() {
        let tools = vec![required_tool("dcg", 0, "cargo install dcg")];
        let detected = vec![DetectedTool {
            name: "dcg".into(),
            available: true,
            version: None,
            error: None,
        }];
        let install_plan = plan(&tools, &detected);
        let script = format_install_script(&install_plan);
        assert!(script.contains("already installed"));
    }

    #[test]
    fn entries_sorted_by_phase_ascending() {
        let tools = vec![
            required_tool("b", 2, "install b"),
            required_tool("a", 1, "install a"),
        ];
        let install_plan = plan(&tools, &[]);
        let ids: Vec<&str> = install_plan.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
