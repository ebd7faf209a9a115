//! Error type for `cursus-sync`.
//!
//! Only run-aborting failures are errors. Per-record and per-call problems
//! are counted or collected in `SyncStats::errors` instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
  #[error("ScoDoc connectivity check failed: {0}")]
  Connectivity(String),

  #[error("departments file not found: {}", .0.display())]
  MissingDepartments(PathBuf),

  #[error("failed to read {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid JSON in {}: {source}", path.display())]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// The transactional apply failed; nothing from this run was kept.
  #[error("store error, run rolled back: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
