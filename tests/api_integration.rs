mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use carms_platform::api::{self, AppState};
use carms_platform::{EtlEngine, LocalStorage, MemoryWarehouse, ProgramPipeline};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn loaded_router() -> Router {
    let dir = common::source_dir();
    let settings = common::write_sources(dir.path(), true);
    let warehouse = Arc::new(MemoryWarehouse::new());

    let storage = LocalStorage::new(settings.raw_data_dir.clone());
    EtlEngine::new(ProgramPipeline::new(storage, settings, warehouse.clone()))
        .run()
        .await
        .unwrap();

    api::router(AppState::new(warehouse))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let app = api::router(AppState::new(Arc::new(MemoryWarehouse::new())));
    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_reference_lists_are_ordered_by_id() {
    let app = loaded_router().await;

    let (status, body) = get(&app, "/api/v1/disciplines").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 1, "name": "Anesthesiology"},
            {"id": 2, "name": "Family Medicine"},
            {"id": 3, "name": "Pathology"}
        ])
    );

    let (_, body) = get(&app, "/api/v1/schools").await;
    assert_eq!(
        body,
        json!([
            {"id": 10, "name": "McGill University"},
            {"id": 11, "name": "University of Toronto"},
            {"id": 12, "name": "Dalhousie University"}
        ])
    );
}

#[tokio::test]
async fn test_program_filters_and_paging() {
    let app = loaded_router().await;

    let (status, body) = get(&app, "/api/v1/programs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), [27447, 27448, 27449, 27450]);
    assert_eq!(body[0]["school_name"], "University of Toronto");
    assert_eq!(body[0]["discipline_name"], "Anesthesiology");
    assert_eq!(body[3]["discipline_name"], Value::Null);

    let (_, body) = get(&app, "/api/v1/programs?school_id=11").await;
    assert_eq!(ids(&body), [27447, 27448]);

    let (_, body) = get(&app, "/api/v1/programs?school_id=11&discipline_id=2").await;
    assert_eq!(ids(&body), [27448]);

    let (_, body) = get(&app, "/api/v1/programs?search=Family%20Medicine").await;
    assert_eq!(ids(&body), [27448, 27449]);

    // search is case sensitive
    let (_, body) = get(&app, "/api/v1/programs?search=family").await;
    assert!(ids(&body).is_empty());

    let (_, body) = get(&app, "/api/v1/programs?search=").await;
    assert_eq!(ids(&body).len(), 4);

    let (_, body) = get(&app, "/api/v1/programs?offset=1&limit=2").await;
    assert_eq!(ids(&body), [27448, 27449]);

    let (_, body) = get(&app, "/api/v1/programs?limit=0").await;
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn test_invalid_program_queries_are_unprocessable() {
    let app = loaded_router().await;

    for uri in [
        "/api/v1/programs?limit=1001",
        "/api/v1/programs?limit=-1",
        "/api/v1/programs?offset=-5",
        "/api/v1/programs?school_id=abc",
        "/api/v1/programs/abc",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert!(body["detail"].is_string(), "{}", uri);
    }

    let (status, _) = get(&app, "/api/v1/programs?limit=1000").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_program_detail() {
    let app = loaded_router().await;

    let (status, body) = get(&app, "/api/v1/programs/27447").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Anesthesiology - Toronto");
    assert_eq!(body["url"], "https://www.carms.ca/program/27447");
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["title"], "Program Overview");

    let (_, body) = get(&app, "/api/v1/programs/27449").await;
    assert!(body["sections"].as_array().unwrap().is_empty());

    let (status, body) = get(&app, "/api/v1/programs/99999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Program not found"}));
}

#[tokio::test]
async fn test_analytics() {
    let app = loaded_router().await;

    let (status, body) = get(&app, "/api/v1/analytics/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "total_programs": 4,
            "total_disciplines": 3,
            "total_schools": 3,
            "avg_sections_per_program": 0.75
        })
    );

    let (_, body) = get(&app, "/api/v1/analytics/counts/disciplines").await;
    assert_eq!(
        body,
        json!([
            {"discipline": "Family Medicine", "count": 2},
            {"discipline": "Anesthesiology", "count": 1},
            {"discipline": "Pathology", "count": 0}
        ])
    );

    let (_, body) = get(&app, "/api/v1/analytics/counts/schools").await;
    assert_eq!(
        body,
        json!([
            {"school": "University of Toronto", "count": 2},
            {"school": "Dalhousie University", "count": 1},
            {"school": "McGill University", "count": 1}
        ])
    );
}

#[tokio::test]
async fn test_empty_warehouse_overview() {
    let app = api::router(AppState::new(Arc::new(MemoryWarehouse::new())));

    let (_, body) = get(&app, "/api/v1/analytics/overview").await;
    assert_eq!(body["total_programs"], 0);
    assert_eq!(body["avg_sections_per_program"], 0.0);

    let (_, body) = get(&app, "/api/v1/analytics/counts/schools").await;
    assert_eq!(body, json!([]));
}
