use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use leadpulse_server::state::AppState;

/// `leadpulse health`: exit 0 when `GET /health` on the local port answers
/// 200, exit 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("LEADPULSE_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("leadpulse=info".parse()?),
        )
        .json()
        .init();

    let cfg = leadpulse_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    cfg.timezone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| anyhow::anyhow!("invalid LEADPULSE_TIMEZONE '{}'", cfg.timezone))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db = leadpulse_duckdb::DuckDbBackend::open(&cfg.db_path(), &cfg.duckdb_memory_limit)?;

    info!(
        fiscal_source = ?cfg.fiscal_source,
        max_periods = cfg.reports.max_periods,
        timezone = %cfg.timezone,
        "Report settings loaded"
    );

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(db, cfg.clone()));
    let app = leadpulse_server::app::build_app(state);

    info!(port = cfg.port, "LeadPulse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
