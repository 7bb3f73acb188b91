use std::sync::Arc;

use leadpulse_core::{
    config::{Config, FiscalSource},
    fiscal::FiscalCalendar,
    report::ReportEngine,
};
use leadpulse_duckdb::DuckDbBackend;

/// Shared application state injected into every handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Also backs the health probe.
    pub db: Arc<DuckDbBackend>,

    pub engine: ReportEngine,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let fiscal: Arc<dyn FiscalCalendar> = match &config.fiscal_source {
            FiscalSource::Table => db.clone(),
            FiscalSource::Fixed(calendar) => Arc::new(*calendar),
        };
        let engine = ReportEngine::new(db.clone(), fiscal, config.reports.clone());
        Self {
            db,
            engine,
            config: Arc::new(config),
        }
    }
}
