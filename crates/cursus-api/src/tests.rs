use std::{path::Path, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode},
  response::Response,
};
use cursus_core::department::default_hidden_departments;
use cursus_scodoc::ScoDocClient;
use cursus_store_sqlite::SqliteStore;
use cursus_sync::SyncSettings;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

async fn make_state(json_dir: &Path) -> AppState<SqliteStore, ScoDocClient> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState {
    store:  Arc::new(store),
    scodoc: None,
    config: Arc::new(ApiConfig {
      json_dir:           json_dir.to_path_buf(),
      first_year:         None,
      last_year:          None,
      sync:               SyncSettings::default(),
      hidden_departments: default_hidden_departments(),
    }),
  }
}

async fn send(state: AppState<SqliteStore, ScoDocClient>, method: &str, uri: &str) -> Response {
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .body(Body::empty())
    .unwrap();
  router(state).oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn write_exports(dir: &Path) {
  std::fs::write(
    dir.join("departements.json"),
    json!([{"id": 3, "dept_name": "GEII", "acronym": "GEII"}]).to_string(),
  )
  .unwrap();
  std::fs::write(
    dir.join("decisions_geii_2022_fa.json"),
    json!([{"etudid": "123", "decision": {"code": "ADM"}}]).to_string(),
  )
  .unwrap();
}

#[tokio::test]
async fn empty_store_is_not_ready() {
  let dir = tempfile::tempdir().unwrap();
  let resp = send(make_state(dir.path()).await, "GET", "/status").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await["ready"], json!(false));
}

#[tokio::test]
async fn file_sync_then_read_path() {
  let dir = tempfile::tempdir().unwrap();
  write_exports(dir.path());
  let state = make_state(dir.path()).await;

  let resp = send(state.clone(), "POST", "/sync/files").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let report = body_json(resp).await;
  assert_eq!(report["counts"]["inscriptions"], json!(1));
  assert_eq!(report["counts"]["nouveaux"], json!(1));
  assert_eq!(report["stats"]["errors"], json!([]));

  let status = body_json(send(state.clone(), "GET", "/status").await).await;
  assert_eq!(status["ready"], json!(true));

  let years = body_json(send(state.clone(), "GET", "/years").await).await;
  assert_eq!(years, json!([2022]));

  let departments = body_json(send(state.clone(), "GET", "/departments").await).await;
  let acronyms: Vec<_> = departments
    .as_array()
    .unwrap()
    .iter()
    .map(|d| d["acronym"].as_str().unwrap().to_owned())
    .collect();
  // The CJ→GEA bridge is hidden from readers by default.
  assert_eq!(acronyms, ["GEII", "P_SD_INFO"]);

  let rows = body_json(
    send(state.clone(), "GET", "/cohorts?start_year=2021&department=geii&rhythm=FA").await,
  )
  .await;
  assert_eq!(rows, json!([{
    "ine": "123",
    "academic_year": 2022,
    "program_year": 2,
    "decision": "ADM",
    "department": "GEII",
    "rhythm": "FA",
  }]));

  let rows = body_json(send(state, "GET", "/cohorts?start_year=2021&rhythm=FI").await).await;
  assert_eq!(rows, json!([]));
}

#[tokio::test]
async fn student_history_is_served_by_ine() {
  let dir = tempfile::tempdir().unwrap();
  write_exports(dir.path());
  let state = make_state(dir.path()).await;
  assert_eq!(send(state.clone(), "POST", "/sync/files").await.status(), StatusCode::OK);

  let resp = send(state.clone(), "GET", "/students/123").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await, json!({
    "ine": "123",
    "enrollments": [{
      "academic_year": 2022,
      "program_year": 2,
      "department": "GEII",
      "rhythm": "FA",
      "state": "I",
      "decision": "ADM",
      "evaluations": [],
    }],
  }));

  let resp = send(state, "GET", "/students/999").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(body_json(resp).await["error"], json!("no student with INE 999"));
}

#[tokio::test]
async fn file_sync_without_departments_reports_error() {
  let dir = tempfile::tempdir().unwrap();
  let resp = send(make_state(dir.path()).await, "POST", "/sync/files").await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body = body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("departements.json"));
}

#[tokio::test]
async fn scodoc_sync_without_client_is_unavailable() {
  let dir = tempfile::tempdir().unwrap();
  let resp = send(make_state(dir.path()).await, "POST", "/sync/scodoc").await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body_json(resp).await["error"], json!("no ScoDoc client configured"));
}

#[tokio::test]
async fn unknown_rhythm_is_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let state = make_state(dir.path()).await;
  let resp = send(state, "GET", "/cohorts?start_year=2021&rhythm=XX").await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(body_json(resp).await["error"], json!("unknown rhythm: XX"));
}
