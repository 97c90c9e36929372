use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use fieldwise_core::estimate::yields::HistoricalYields;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub dataset: Arc<HistoricalYields>,
    pub live_prices_enabled: bool,
    pub llm_model: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub dataset: HealthCheck,
    pub live_prices_enabled: bool,
    pub llm_model: String,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Always 200 once the process is up. A missing dataset only degrades yield estimates to
/// reference values, so it is reported but not treated as unavailable.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let dataset = dataset_check(&state.dataset);
    let ready = dataset.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "fieldwise-server runtime initialized".to_string(),
        },
        dataset,
        live_prices_enabled: state.live_prices_enabled,
        llm_model: state.llm_model.clone(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn dataset_check(dataset: &HistoricalYields) -> HealthCheck {
    if dataset.is_available() {
        HealthCheck { status: "ready", detail: format!("{} historical records loaded", dataset.len()) }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "historical dataset unavailable, using reference yields".to_string(),
        }
    }
}
