//! Discipline, school and program read endpoints.

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::domain::model::{
    DisciplineRead, ProgramDetailRead, ProgramFilter, ProgramRead, SchoolRead,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ProgramQuery {
    pub school_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub search: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ProgramQuery {
    fn into_filter(self) -> Result<ProgramFilter, ApiError> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if offset < 0 {
            return Err(ApiError::Unprocessable(
                "offset must be greater than or equal to 0".to_string(),
            ));
        }
        if !(0..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ApiError::Unprocessable(format!(
                "limit must be between 0 and {}",
                MAX_PAGE_LIMIT
            )));
        }

        Ok(ProgramFilter {
            school_id: self.school_id,
            discipline_id: self.discipline_id,
            search: self.search,
            offset,
            limit,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/disciplines", get(list_disciplines))
        .route("/schools", get(list_schools))
        .route("/programs", get(list_programs))
        .route("/programs/{program_id}", get(get_program))
}

async fn list_disciplines(
    State(state): State<AppState>,
) -> Result<Json<Vec<DisciplineRead>>, ApiError> {
    Ok(Json(state.warehouse.list_disciplines().await?))
}

async fn list_schools(State(state): State<AppState>) -> Result<Json<Vec<SchoolRead>>, ApiError> {
    Ok(Json(state.warehouse.list_schools().await?))
}

async fn list_programs(
    State(state): State<AppState>,
    query: Result<Query<ProgramQuery>, QueryRejection>,
) -> Result<Json<Vec<ProgramRead>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let filter = query.into_filter()?;
    tracing::debug!("Listing programs with {:?}", filter);
    Ok(Json(state.warehouse.list_programs(&filter).await?))
}

async fn get_program(
    State(state): State<AppState>,
    program_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProgramDetailRead>, ApiError> {
    let Path(program_id) = program_id.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    state
        .warehouse
        .get_program(program_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Program not found"))
}
