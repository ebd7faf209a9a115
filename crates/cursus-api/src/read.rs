//! Read-only handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/status` | Never fails on an uninitialised store |
//! | `GET`  | `/departments` | Ordered by acronym, hidden acronyms left out |
//! | `GET`  | `/years` | Academic years with enrollments |
//! | `GET`  | `/cohorts` | `?start_year=<y>[&department=<acr>][&rhythm=FI\|FA]` |
//! | `GET`  | `/students/{ine}` | 404 for an unknown INE |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use cursus_core::{
  department::{Department, normalize_acronym},
  reference::Rhythm,
  store::{AcademicStore, CohortQuery, CohortRow, Readiness, StudentHistory},
};
use cursus_scodoc::ScoDocApi;
use serde::Deserialize;

use crate::{
  AppState,
  error::{ApiError, store_err},
};

/// `GET /status`
pub async fn status<S, C>(State(state): State<AppState<S, C>>) -> Result<Json<Readiness>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  let readiness = state.store.readiness().await.map_err(store_err)?;
  Ok(Json(readiness))
}

/// `GET /departments`
pub async fn departments<S, C>(
  State(state): State<AppState<S, C>>,
) -> Result<Json<Vec<Department>>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  let hidden = &state.config.hidden_departments;
  let departments = state
    .store
    .list_departments()
    .await
    .map_err(store_err)?
    .into_iter()
    .filter(|d| !hidden.iter().any(|h| normalize_acronym(h) == d.acronym))
    .collect();
  Ok(Json(departments))
}

/// `GET /years`
pub async fn years<S, C>(State(state): State<AppState<S, C>>) -> Result<Json<Vec<i32>>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  let years = state.store.list_academic_years().await.map_err(store_err)?;
  Ok(Json(years))
}

#[derive(Debug, Deserialize)]
pub struct CohortParams {
  pub start_year: i32,
  pub department: Option<String>,
  /// `FI` or `FA`.
  pub rhythm:     Option<String>,
}

impl CohortParams {
  fn into_query(self) -> Result<CohortQuery, ApiError> {
    let rhythm = match self.rhythm.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(
        Rhythm::from_acronym(raw)
          .ok_or_else(|| ApiError::BadRequest(format!("unknown rhythm: {raw}")))?,
      ),
    };
    let department = self
      .department
      .map(|d| d.trim().to_uppercase())
      .filter(|d| !d.is_empty());
    Ok(CohortQuery { start_year: self.start_year, department, rhythm })
  }
}

/// `GET /cohorts?start_year=<y>[&department=<acr>][&rhythm=<FI|FA>]`
pub async fn cohorts<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<CohortParams>,
) -> Result<Json<Vec<CohortRow>>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  let query = params.into_query()?;
  let rows = state.store.search_cohort(&query).await.map_err(store_err)?;
  Ok(Json(rows))
}

/// `GET /students/{ine}`
pub async fn student<S, C>(
  State(state): State<AppState<S, C>>,
  Path(ine): Path<String>,
) -> Result<Json<StudentHistory>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  match state.store.student_history(&ine).await.map_err(store_err)? {
    Some(history) => Ok(Json(history)),
    None => Err(ApiError::NotFound(format!("no student with INE {ine}"))),
  }
}
