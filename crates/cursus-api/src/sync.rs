//! Handlers that trigger a synchronisation run.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sync/files` | Imports the configured export directory |
//! | `POST` | `/sync/scodoc` | 503 when no ScoDoc client is configured |

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use cursus_core::{stats::SyncStats, store::AcademicStore};
use cursus_scodoc::ScoDocApi;
use cursus_sync::{FilesSource, ScoDocSource};
use serde::Serialize;
use tracing::info;

use crate::{AppState, error::ApiError};

/// Outcome of a run: the raw statistics plus the operator-facing counts.
#[derive(Debug, Serialize)]
pub struct SyncReport {
  pub stats:  SyncStats,
  pub counts: BTreeMap<&'static str, u64>,
}

impl From<SyncStats> for SyncReport {
  fn from(stats: SyncStats) -> Self { Self { counts: stats.counts(), stats } }
}

/// `POST /sync/files`
pub async fn files<S, C>(State(state): State<AppState<S, C>>) -> Result<Json<SyncReport>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  let source = FilesSource::new(&state.config.json_dir, state.config.sync.rules.clone());
  let stats = cursus_sync::run(&*state.store, &source, &state.config.sync).await?;
  info!(
    dir = %state.config.json_dir.display(),
    enrollments = stats.enrollments,
    errors = stats.errors.len(),
    "file sync requested over HTTP completed"
  );
  Ok(Json(stats.into()))
}

/// `POST /sync/scodoc`
pub async fn scodoc<S, C>(State(state): State<AppState<S, C>>) -> Result<Json<SyncReport>, ApiError>
where
  S: AcademicStore,
  C: ScoDocApi,
{
  let Some(client) = state.scodoc.as_deref() else {
    return Err(ApiError::Unavailable("no ScoDoc client configured".into()));
  };
  let source = ScoDocSource::new(client)
    .with_years(state.config.first_year, state.config.last_year);
  let stats = cursus_sync::run(&*state.store, &source, &state.config.sync).await?;
  info!(
    enrollments = stats.enrollments,
    errors = stats.errors.len(),
    "ScoDoc sync requested over HTTP completed"
  );
  Ok(Json(stats.into()))
}
