use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::config::FiscalSource;
use crate::state::AppState;

/// `GET /health`: `200` with `{ "status": "ok", "version", "fiscal_source" }`
/// when DuckDB answers, `503` with `"status": "degraded"` otherwise.
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let fiscal_source = match state.config.fiscal_source {
        FiscalSource::Table => "table",
        FiscalSource::Fixed(_) => "fixed",
    };
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "fiscal_source": fiscal_source
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check: DuckDB unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "version": env!("CARGO_PKG_VERSION"),
                    "fiscal_source": fiscal_source
                })),
            )
                .into_response()
        }
    }
}
