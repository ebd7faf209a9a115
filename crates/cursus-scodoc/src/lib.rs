//! Client side of the ScoDoc academic-information API.
//!
//! [`ScoDocApi`] is the typed fetch surface the synchronisation pipeline
//! consumes; [`ScoDocClient`] implements it over HTTP. The wire types in
//! [`types`] are also the shape of the JSON export files, which are dumps of
//! the same endpoints.

pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

pub use client::{ScoDocClient, ScoDocConfig};
pub use error::{Error, Result};
use types::{ApiDepartment, ApiFramework, ApiProgram, ApiTerm, JuryRecord};

/// Outcome of the initial connectivity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connectivity {
  pub ok:      bool,
  pub message: String,
}

/// Typed read operations against ScoDoc.
///
/// Every call is independent; a failed call must not poison later ones.
pub trait ScoDocApi: Send + Sync {
  fn test_connectivity(&self) -> impl Future<Output = Connectivity> + Send + '_;

  fn list_departments(&self) -> impl Future<Output = Result<Vec<ApiDepartment>>> + Send + '_;

  /// Programs, optionally restricted to one department.
  fn list_programs(
    &self,
    department_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<ApiProgram>>> + Send + '_;

  /// The competency framework attached to a program, if it has one.
  fn list_competency_framework(
    &self,
    program_id: i64,
  ) -> impl Future<Output = Result<Option<ApiFramework>>> + Send + '_;

  /// Terms (formsemestres) running during the academic year starting in
  /// `year`.
  fn query_terms_for_year(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Vec<ApiTerm>>> + Send + '_;

  fn list_jury_decisions(
    &self,
    term_id: i64,
  ) -> impl Future<Output = Result<Vec<JuryRecord>>> + Send + '_;
}
