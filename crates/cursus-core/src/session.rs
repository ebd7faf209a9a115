//! The `SyncSession` trait, the transactional write handle the pipeline
//! runs against.
//!
//! A session is only ever obtained through
//! [`AcademicStore::transaction`](crate::store::AcademicStore::transaction):
//! every write made through it is committed together when the closure returns
//! `Ok`, and rolled back when it returns `Err`.
//!
//! All `ensure_*` methods are insert-if-absent on the entity's natural key and
//! report whether a row was actually written.

use std::collections::HashMap;

use crate::{
  competency::{Evaluation, NewCompetency, NewParcours, Upsert},
  department::{Department, NewDepartment},
  enrollment::{EnrollmentKey, EnrollmentOutcome, NewEnrollment},
  ids::{CompetencyId, DecisionId, DepartmentId, ParcoursId, ProgramId, StudentId},
  program::{Program, ProgramKey},
  reference::{EnrollmentState, Rhythm},
};

/// The surrogate key of an insert-if-absent, and whether this call inserted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ensured<T> {
  pub id:       T,
  pub inserted: bool,
}

impl<T> Ensured<T> {
  pub fn inserted(id: T) -> Self { Self { id, inserted: true } }

  pub fn existing(id: T) -> Self { Self { id, inserted: false } }
}

/// Bound shared by every session error type.
pub trait SessionError: std::error::Error + Send + Sync + 'static {}

impl<E> SessionError for E where E: std::error::Error + Send + Sync + 'static {}

/// Write access to the store within one transaction.
///
/// The trait is object safe; the store hands the pipeline a
/// `&mut dyn SyncSession<Error = _>`.
pub trait SyncSession {
  type Error: SessionError;

  // ── Reference data ────────────────────────────────────────────────────

  fn ensure_rhythm(&mut self, rhythm: Rhythm) -> Result<bool, Self::Error>;

  fn ensure_enrollment_state(
    &mut self,
    state: EnrollmentState,
  ) -> Result<bool, Self::Error>;

  /// Insert-if-absent keyed on the (normalized) acronym.
  fn ensure_decision(
    &mut self,
    name: &str,
    acronym: &str,
  ) -> Result<Ensured<DecisionId>, Self::Error>;

  /// All decisions, keyed by acronym.
  fn decision_ids(&mut self) -> Result<HashMap<String, DecisionId>, Self::Error>;

  // ── Departments and programs ──────────────────────────────────────────

  /// Insert-if-absent keyed on the acronym. Returns `None` when the acronym
  /// is absent but the id is already taken by another department.
  fn ensure_department(
    &mut self,
    department: &NewDepartment,
  ) -> Result<Option<Ensured<DepartmentId>>, Self::Error>;

  fn departments(&mut self) -> Result<Vec<Department>, Self::Error>;

  fn ensure_program(&mut self, key: ProgramKey) -> Result<Ensured<ProgramId>, Self::Error>;

  fn programs(&mut self) -> Result<Vec<Program>, Self::Error>;

  // ── Students and enrollments ──────────────────────────────────────────

  /// Insert-if-absent keyed on the INE, which callers pass normalized.
  fn ensure_student(&mut self, ine: &str) -> Result<Ensured<StudentId>, Self::Error>;

  fn insert_enrollment(
    &mut self,
    enrollment: &NewEnrollment,
    key: EnrollmentKey,
  ) -> Result<EnrollmentOutcome, Self::Error>;

  // ── Competencies ──────────────────────────────────────────────────────

  fn ensure_parcours(
    &mut self,
    parcours: &NewParcours,
  ) -> Result<Ensured<ParcoursId>, Self::Error>;

  fn ensure_competency(
    &mut self,
    competency: &NewCompetency,
  ) -> Result<Ensured<CompetencyId>, Self::Error>;

  /// Insert or replace the row for (enrollment, competency).
  fn upsert_evaluation(&mut self, evaluation: &Evaluation) -> Result<Upsert, Self::Error>;
}
