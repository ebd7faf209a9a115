//! Competency frameworks (parcours), competencies and per-student evaluations.

use serde::{Deserialize, Serialize};

use crate::ids::{CompetencyId, DecisionId, DepartmentId, EnrollmentId, ParcoursId};

/// Code of the parcours that collects competencies not tied to a named track.
pub const COMMON_CORE_CODE: &str = "TC";
pub const COMMON_CORE_LABEL: &str = "Tronc commun";

/// A named specialization track belonging to a department.
/// Unique on (department, code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcours {
  pub id:         ParcoursId,
  pub department: DepartmentId,
  pub code:       String,
  pub label:      String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParcours {
  pub department: DepartmentId,
  pub code:       String,
  pub label:      String,
}

impl NewParcours {
  pub fn common_core(department: DepartmentId) -> Self {
    Self {
      department,
      code: COMMON_CORE_CODE.to_owned(),
      label: COMMON_CORE_LABEL.to_owned(),
    }
  }
}

/// A granular skill outcome. Unique on (parcours, code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competency {
  pub id:       CompetencyId,
  pub parcours: ParcoursId,
  pub code:     String,
  pub label:    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompetency {
  pub parcours: ParcoursId,
  pub code:     String,
  pub label:    String,
}

/// Short competency code derived from the external sequence number.
pub fn competency_code(number: i64) -> String { format!("C{number}") }

/// One row per (enrollment, competency); re-imports overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
  pub enrollment: EnrollmentId,
  pub competency: CompetencyId,
  pub decision:   Option<DecisionId>,
  pub average:    Option<f64>,
}

/// What [`crate::session::SyncSession::upsert_evaluation`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
  Inserted,
  Replaced,
}
