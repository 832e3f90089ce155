//! Daydream Cash Cannon - dashboard server
//!
//! Usage:
//!   cargo run -- --env dev
//!   cargo run -- --env prod --port 9090

use std::sync::Arc;

use anyhow::Context;
use cash_cannon::config::AppConfig;
use cash_cannon::gateway::{self, AppState};
use cash_cannon::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the variables directly
    dotenvy::dotenv().ok();

    let env = get_env();
    let mut app_config =
        AppConfig::load(&env).with_context(|| format!("loading config for env '{}'", env))?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }

    let _log_guard = init_logging(&app_config);

    tracing::info!(
        version = env!("GIT_HASH"),
        "Starting Daydream Cash Cannon in {} mode",
        env
    );
    tracing::info!(
        operating_org = %app_config.transfer.operating_org,
        events_view = %app_config.records.events_view,
        "Disbursements route through the operating organization"
    );

    let state = AppState::from_config(&app_config).context("building upstream clients")?;
    gateway::run_server(&app_config.gateway, Arc::new(state))
        .await
        .context("dashboard server stopped")?;

    Ok(())
}
