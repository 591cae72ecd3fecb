//! Aggregate statistics over the loaded programs.

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::domain::model::{AnalyticsOverview, DisciplineCount, SchoolCount};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/counts/disciplines", get(counts_by_discipline))
        .route("/counts/schools", get(counts_by_school))
}

/// Totals plus the average number of description sections per program.
async fn overview(State(state): State<AppState>) -> Result<Json<AnalyticsOverview>, ApiError> {
    Ok(Json(state.warehouse.overview().await?))
}

async fn counts_by_discipline(
    State(state): State<AppState>,
) -> Result<Json<Vec<DisciplineCount>>, ApiError> {
    Ok(Json(state.warehouse.counts_by_discipline().await?))
}

async fn counts_by_school(
    State(state): State<AppState>,
) -> Result<Json<Vec<SchoolCount>>, ApiError> {
    Ok(Json(state.warehouse.counts_by_school().await?))
}
