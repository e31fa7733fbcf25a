//! `acfsd status` — one-shot read of the Snapshot Aggregator.

use crate::wiring::Gateway;

pub async fn run(gateway: &Gateway, fresh: bool, json: bool) -> anyhow::Result<()> {
    let snapshot = gateway.aggregator.get_snapshot(fresh).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("overall:     {:?}", snapshot.summary.status);
    println!("ntm:         {:?}", snapshot.summary.ntm);
    println!("beads:       {:?}", snapshot.summary.beads);
    println!("tools:       {:?}", snapshot.summary.tools);
    println!("agent_mail:  {:?}", snapshot.summary.agent_mail);
    if !snapshot.summary.issues.is_empty() {
        println!("issues:");
        for issue in &snapshot.summary.issues {
            println!("  - {issue}");
        }
    }
    println!(
        "tools detected: {}/{} available, {} required missing, {} cascade failures",
        snapshot.tools.detected_available,
        snapshot.tools.detected_total,
        snapshot.tools.required_missing,
        snapshot.tools.cascade_failures,
    );
    println!(
        "agent mail: {} unread across {} recent message(s), {} agent(s)",
        snapshot.agent_mail.unread_count,
        snapshot.agent_mail.recent.len(),
        snapshot.agent_mail.agent_count,
    );

    Ok(())
}
