//! Run statistics returned to the caller of a synchronisation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rows written by one pipeline run, plus the non-fatal errors collected
/// along the way. Every counter counts rows actually inserted, not rows
/// attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
  pub departments:         u64,
  pub rhythms:             u64,
  pub states:              u64,
  pub decisions:           u64,
  pub formations:          u64,
  /// Distinct students seen in the source during this run.
  pub students_total:      u64,
  pub students_new:        u64,
  pub enrollments:         u64,
  /// Records that produced no enrollment (missing INE, no decision, no
  /// program, unknown department).
  pub enrollments_skipped: u64,
  /// Records whose logical key already exists with a different outcome.
  pub conflicts:           u64,
  pub parcours:            u64,
  pub competencies:        u64,
  pub evaluations:         u64,
  pub evaluations_updated: u64,
  pub errors:              Vec<String>,
}

impl SyncStats {
  pub fn students_known(&self) -> u64 {
    self.students_total.saturating_sub(self.students_new)
  }

  /// Category name → count, as displayed to operators.
  pub fn counts(&self) -> BTreeMap<&'static str, u64> {
    BTreeMap::from([
      ("departements", self.departments),
      ("rythmes", self.rhythms),
      ("etats", self.states),
      ("decisions", self.decisions),
      ("formations", self.formations),
      ("etudiants", self.students_total),
      ("nouveaux", self.students_new),
      ("connus", self.students_known()),
      ("inscriptions", self.enrollments),
      ("ignorees", self.enrollments_skipped),
      ("conflits", self.conflicts),
      ("parcours", self.parcours),
      ("competences", self.competencies),
      ("evaluations", self.evaluations),
      ("evaluations_maj", self.evaluations_updated),
    ])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_students_never_underflow() {
    let stats = SyncStats { students_total: 1, students_new: 3, ..Default::default() };
    assert_eq!(stats.students_known(), 0);
  }

  #[test]
  fn counts_use_operator_names() {
    let stats = SyncStats {
      students_total: 5,
      students_new: 2,
      enrollments: 7,
      ..Default::default()
    };
    let counts = stats.counts();
    assert_eq!(counts["nouveaux"], 2);
    assert_eq!(counts["connus"], 3);
    assert_eq!(counts["inscriptions"], 7);
  }
}
