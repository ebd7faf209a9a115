//! JSON HTTP boundary for Cursus.
//!
//! Exposes an axum [`Router`] backed by any [`AcademicStore`], optionally
//! paired with a [`ScoDocApi`] client. Every request is traced through
//! `tower-http`. Auth and TLS are the caller's responsibility.

pub mod error;
pub mod read;
pub mod sync;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use cursus_core::store::AcademicStore;
use cursus_scodoc::ScoDocApi;
use cursus_sync::SyncSettings;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use sync::SyncReport;

// ─── Application state ───────────────────────────────────────────────────────

/// Handler configuration beyond the store.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Directory holding `departements.json` and the `decisions_*.json` files.
  pub json_dir:           PathBuf,
  pub first_year:         Option<i32>,
  pub last_year:          Option<i32>,
  pub sync:               SyncSettings,
  /// Acronyms left out of `GET /departments`.
  pub hidden_departments: Vec<String>,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub store:  Arc<S>,
  pub scodoc: Option<Arc<C>>,
  pub config: Arc<ApiConfig>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      scodoc: self.scodoc.clone(),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: AcademicStore + 'static,
  C: ScoDocApi + 'static,
{
  Router::new()
    // Read path
    .route("/status", get(read::status::<S, C>))
    .route("/departments", get(read::departments::<S, C>))
    .route("/years", get(read::years::<S, C>))
    .route("/cohorts", get(read::cohorts::<S, C>))
    .route("/students/{ine}", get(read::student::<S, C>))
    // Synchronisation
    .route("/sync/files", post(sync::files::<S, C>))
    .route("/sync/scodoc", post(sync::scodoc::<S, C>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
