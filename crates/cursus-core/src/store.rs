//! The `AcademicStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `cursus-store-sqlite`).
//! The pipeline and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{department::Department, reference::Rhythm, session::SyncSession};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Whether the store holds enough data to serve the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
  pub departments: u64,
  pub enrollments: u64,
  /// At least one department and one enrollment, and every table present.
  pub ready:       bool,
}

impl Readiness {
  pub fn from_counts(departments: u64, enrollments: u64) -> Self {
    Self { departments, enrollments, ready: departments > 0 && enrollments > 0 }
  }

  /// Reported when the schema is missing or unreadable.
  pub fn not_ready() -> Self { Self { departments: 0, enrollments: 0, ready: false } }
}

/// Parameters for [`AcademicStore::search_cohort`].
///
/// A cohort is the set of students who started the program in `start_year`:
/// an enrollment matches when its academic year equals
/// `start_year + program_year - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortQuery {
  pub start_year: i32,
  /// Restrict to a department acronym.
  pub department: Option<String>,
  pub rhythm:     Option<Rhythm>,
}

/// One row of a cohort search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortRow {
  pub ine:           String,
  pub academic_year: i32,
  pub program_year:  u8,
  /// Decision acronym, if the enrollment has one.
  pub decision:      Option<String>,
  pub department:    String,
  pub rhythm:        String,
}

/// Everything recorded for one student, oldest enrollment first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentHistory {
  pub ine:         String,
  pub enrollments: Vec<EnrollmentRecord>,
}

/// One enrollment of a [`StudentHistory`], with its program spelled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
  pub academic_year: i32,
  pub program_year:  u8,
  pub department:    String,
  pub rhythm:        String,
  /// Enrollment-state acronym.
  pub state:         String,
  pub decision:      Option<String>,
  pub evaluations:   Vec<EvaluationRecord>,
}

/// A competency outcome attached to an [`EnrollmentRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
  pub parcours:   String,
  /// Competency code, e.g. `C1`.
  pub competency: String,
  pub label:      String,
  pub decision:   Option<String>,
  pub average:    Option<f64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Cursus store backend.
///
/// Writes only happen inside [`AcademicStore::transaction`]; everything else
/// is read-only.
pub trait AcademicStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run `f` against a fresh [`SyncSession`] inside one transaction.
  ///
  /// The transaction is committed when `f` returns `Ok` and rolled back when
  /// it returns `Err`. The session is released on every exit path.
  fn transaction<T, F>(
    &self,
    f: F,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn SyncSession<Error = Self::Error>) -> Result<T, Self::Error>
      + Send
      + 'static;

  /// Report whether the store is populated. Missing tables yield a
  /// not-ready answer rather than an error.
  fn readiness(&self) -> impl Future<Output = Result<Readiness, Self::Error>> + Send + '_;

  /// All departments, ordered by acronym.
  fn list_departments(
    &self,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_;

  /// Distinct academic years that have at least one enrollment, ascending.
  fn list_academic_years(
    &self,
  ) -> impl Future<Output = Result<Vec<i32>, Self::Error>> + Send + '_;

  /// Search enrollments belonging to a cohort, ordered by INE.
  fn search_cohort<'a>(
    &'a self,
    query: &'a CohortQuery,
  ) -> impl Future<Output = Result<Vec<CohortRow>, Self::Error>> + Send + 'a;

  /// Every enrollment of the student identified by `ine`, with decisions and
  /// competency evaluations. `None` when no such student is stored.
  fn student_history<'a>(
    &'a self,
    ine: &'a str,
  ) -> impl Future<Output = Result<Option<StudentHistory>, Self::Error>> + Send + 'a;
}
