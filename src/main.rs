use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jira_bulk_archive::archive;
use jira_bulk_archive::config;
use jira_bulk_archive::jira::{JiraClient, JiraService};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("starting Jira bulk archive");
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env file"),
        Err(_) => info!("no .env file found, using process environment"),
    }

    let cfg = config::load()?;
    let strategy = cfg.executor_strategy()?;
    info!(
        base_url = %cfg.jira_base_url,
        project = %cfg.project_key,
        label = %cfg.archive_label,
        ?strategy,
        search_api = ?cfg.search_api,
        page_size = cfg.page_size,
        timeout_secs = cfg.request_timeout_secs,
        "configuration loaded"
    );

    let client: Arc<dyn JiraService> = Arc::new(JiraClient::from_config(&cfg)?);
    let report = archive::run(client, &cfg.filter(), strategy, cfg.page_size).await?;

    println!("{}", report);
    if report.has_failures() {
        warn!("completed with errors");
    } else {
        info!("done");
    }
    Ok(ExitCode::from(report.exit_status()))
}
