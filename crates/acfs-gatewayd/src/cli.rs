//! Command-line surface. The gateway binary is process wiring and
//! introspection, not a REST server (HTTP/WebSocket routing stays an
//! external collaborator per SPEC_FULL.md §1): `status`/`diagnostics`/
//! `plan`/`maintenance` are one-shot reads over the coordination cores,
//! and `serve` is the long-running process that keeps them warm and
//! drains in flight requests on shutdown.

use clap::{Parser, Subcommand};

fn build_version() -> &'static str {
    static VERSION: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION.get_or_init(|| env!("CARGO_PKG_VERSION").to_string())
}

#[derive(Parser)]
#[command(name = "acfsd", version = build_version())]
#[command(about = "Operator gateway coordination core: process wiring and introspection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit machine-readable JSON instead of a human-readable summary.
    #[arg(long, global = true)]
    pub json: bool,

    /// Project root to resolve the manifest/config/Agent-Mail folder
    /// against. Defaults to the current working directory.
    #[arg(long, global = true)]
    pub cd: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect and print a full system snapshot (NTM, beads, tools, Agent Mail).
    Status {
        /// Bypass the aggregator's cache and collect fresh.
        #[arg(long)]
        fresh: bool,
    },
    /// Print dependency-aware health diagnostics for every manifest tool.
    Diagnostics,
    /// Print (or write) the install plan diffed against detected tools.
    Plan {
        /// Emit a runnable `installScript` instead of the plan itself.
        #[arg(long)]
        script: bool,
    },
    /// Inspect or change maintenance mode.
    Maintenance {
        #[command(subcommand)]
        cmd: MaintenanceCommands,
    },
    /// Run the long-lived process: periodic snapshot refresh, event hub,
    /// graceful shutdown draining in-flight requests.
    Serve,
}

#[derive(Subcommand)]
pub enum MaintenanceCommands {
    /// Print the current maintenance status.
    Status,
    /// Enter maintenance mode (rejects new requests).
    Enter {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Begin draining: admit requests but advertise `retryAfterSeconds`.
    Drain {
        #[arg(long, default_value_t = 30)]
        seconds: u64,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Return to running mode.
    Exit,
}
