//! Students and enrollments.
//!
//! A student carries nothing but its INE; every academic fact attaches to it
//! through an enrollment row. Enrollments grow monotonically: the pipeline
//! never updates or deletes one.

use serde::{Deserialize, Serialize};

use crate::{
  ids::{DecisionId, EnrollmentId, ProgramId, StudentId},
  reference::EnrollmentState,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id:  StudentId,
  /// National student identifier, stored normalized.
  pub ine: String,
}

/// Normalize an INE for storage and lookup: trimmed and lower case.
/// Returns `None` for an empty identifier.
pub fn normalize_ine(raw: &str) -> Option<String> {
  let ine = raw.trim().to_lowercase();
  (!ine.is_empty()).then_some(ine)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
  pub id:            EnrollmentId,
  pub academic_year: i32,
  pub student:       StudentId,
  pub state:         EnrollmentState,
  pub program:       ProgramId,
  /// `None` when the source outcome could not be matched to a decision.
  pub decision:      Option<DecisionId>,
}

/// Input to [`crate::session::SyncSession::insert_enrollment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEnrollment {
  pub academic_year: i32,
  pub student:       StudentId,
  pub state:         EnrollmentState,
  pub program:       ProgramId,
  pub decision:      Option<DecisionId>,
}

/// Which columns identify an enrollment for insert-if-absent purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentKey {
  /// At most one row per (student, academic year, program). A re-import with
  /// a different state or decision is reported as a conflict.
  #[default]
  StudentYearProgram,
  /// Insert unless an identical full row exists. Permits several rows per
  /// student and year that differ only in decision or state.
  FullRow,
}

/// What [`crate::session::SyncSession::insert_enrollment`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
  Inserted(EnrollmentId),
  /// An identical row was already present.
  Existing(EnrollmentId),
  /// A row with the same logical key but a different state or decision
  /// exists; nothing was written.
  Conflict(EnrollmentId),
}

impl EnrollmentOutcome {
  pub fn id(self) -> EnrollmentId {
    match self {
      Self::Inserted(id) | Self::Existing(id) | Self::Conflict(id) => id,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ine_normalization() {
    assert_eq!(normalize_ine("  AB12cd ").as_deref(), Some("ab12cd"));
    assert_eq!(normalize_ine("   "), None);
  }
}
