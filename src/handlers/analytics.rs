use crate::{
    cache::views,
    services::analytics::AnalyticsSummary,
    AppState,
};
use axum::{extract::State, routing::get, Json, Router};
use serde_json::Value;
use tracing::error;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(dashboard_summary))
}

/// Dashboard KPIs. Served from the view cache when fresh; on any persistence
/// failure the zeroed summary is returned so the dashboard always renders,
/// with the failure logged at this boundary.
async fn dashboard_summary(State(state): State<AppState>) -> Json<Value> {
    if let Some(cached) = state.views.get(views::DASHBOARD) {
        return Json(cached);
    }

    match state.services.analytics.compute_summary().await {
        Ok(summary) => {
            let value = serde_json::to_value(&summary).unwrap_or_default();
            state.views.put(views::DASHBOARD, value.clone());
            Json(value)
        }
        Err(err) => {
            error!(error = %err, "Analytics error; serving zeroed summary");
            Json(serde_json::to_value(AnalyticsSummary::zeroed()).unwrap_or_default())
        }
    }
}
