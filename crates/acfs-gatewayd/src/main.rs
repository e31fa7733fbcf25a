use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod diagnostics_cmd;
mod maintenance_cmd;
mod plan_cmd;
mod serve_cmd;
mod status_cmd;
mod wiring;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let json = cli.json;

    let project_root = match &cli.cd {
        Some(dir) => std::path::PathBuf::from(dir),
        None => std::env::current_dir()?,
    };

    let config = config::GatewayConfig::load(&project_root)?;
    let gateway = wiring::bootstrap(config)?;

    match cli.command {
        Commands::Status { fresh } => status_cmd::run(&gateway, fresh, json).await?,
        Commands::Diagnostics => diagnostics_cmd::run(&gateway, json).await?,
        Commands::Plan { script } => plan_cmd::run(&gateway, script, json).await?,
        Commands::Maintenance { cmd } => maintenance_cmd::run(&gateway, cmd, json)?,
        Commands::Serve => serve_cmd::run(&gateway).await?,
    }

    Ok(())
}
