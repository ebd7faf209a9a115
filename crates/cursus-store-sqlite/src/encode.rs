//! Decoding helpers between raw SQLite column values and domain types.
//!
//! Enumerations are stored as their fixed integer ids; program years as
//! plain integers guarded by a `CHECK` constraint.

use cursus_core::{
  department::Department,
  ids::{DepartmentId, ProgramId},
  program::{Program, ProgramKey, ProgramYear},
  reference::Rhythm,
  store::{CohortRow, EnrollmentRecord, EvaluationRecord},
};

use crate::Result;

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `departments` row.
pub struct RawDepartment {
  pub department_id: i64,
  pub name:          String,
  pub acronym:       String,
}

impl RawDepartment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { department_id: row.get(0)?, name: row.get(1)?, acronym: row.get(2)? })
  }

  pub fn into_department(self) -> Department {
    Department {
      id:      DepartmentId(self.department_id),
      name:    self.name,
      acronym: self.acronym,
    }
  }
}

/// Raw values read directly from a `programs` row.
pub struct RawProgram {
  pub program_id:    i64,
  pub program_year:  i64,
  pub department_id: i64,
  pub rhythm_id:     i64,
}

impl RawProgram {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      program_id:    row.get(0)?,
      program_year:  row.get(1)?,
      department_id: row.get(2)?,
      rhythm_id:     row.get(3)?,
    })
  }

  pub fn into_program(self) -> Result<Program> {
    Ok(Program {
      id:  ProgramId(self.program_id),
      key: ProgramKey {
        year:       ProgramYear::try_from(self.program_year)?,
        department: DepartmentId(self.department_id),
        rhythm:     Rhythm::from_id(self.rhythm_id)?,
      },
    })
  }
}

/// Raw values read from the cohort search join.
pub struct RawCohortRow {
  pub ine:           String,
  pub academic_year: i32,
  pub program_year:  i64,
  pub decision:      Option<String>,
  pub department:    String,
  pub rhythm:        String,
}

impl RawCohortRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ine:           row.get(0)?,
      academic_year: row.get(1)?,
      program_year:  row.get(2)?,
      decision:      row.get(3)?,
      department:    row.get(4)?,
      rhythm:        row.get(5)?,
    })
  }

  pub fn into_row(self) -> Result<CohortRow> {
    Ok(CohortRow {
      ine:           self.ine,
      academic_year: self.academic_year,
      program_year:  ProgramYear::try_from(self.program_year)?.get(),
      decision:      self.decision,
      department:    self.department,
      rhythm:        self.rhythm,
    })
  }
}

/// Raw values read from the student-history enrollment join.
pub struct RawEnrollmentRecord {
  pub enrollment_id: i64,
  pub academic_year: i32,
  pub program_year:  i64,
  pub department:    String,
  pub rhythm:        String,
  pub state:         String,
  pub decision:      Option<String>,
}

impl RawEnrollmentRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      enrollment_id: row.get(0)?,
      academic_year: row.get(1)?,
      program_year:  row.get(2)?,
      department:    row.get(3)?,
      rhythm:        row.get(4)?,
      state:         row.get(5)?,
      decision:      row.get(6)?,
    })
  }

  pub fn into_record(self, evaluations: Vec<EvaluationRecord>) -> Result<EnrollmentRecord> {
    Ok(EnrollmentRecord {
      academic_year: self.academic_year,
      program_year: ProgramYear::try_from(self.program_year)?.get(),
      department: self.department,
      rhythm: self.rhythm,
      state: self.state,
      decision: self.decision,
      evaluations,
    })
  }
}

/// Raw values read from the student-history evaluation join.
pub struct RawEvaluationRecord {
  pub enrollment_id: i64,
  pub parcours:      String,
  pub competency:    String,
  pub label:         String,
  pub decision:      Option<String>,
  pub average:       Option<f64>,
}

impl RawEvaluationRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      enrollment_id: row.get(0)?,
      parcours:      row.get(1)?,
      competency:    row.get(2)?,
      label:         row.get(3)?,
      decision:      row.get(4)?,
      average:       row.get(5)?,
    })
  }

  pub fn into_record(self) -> EvaluationRecord {
    EvaluationRecord {
      parcours:   self.parcours,
      competency: self.competency,
      label:      self.label,
      decision:   self.decision,
      average:    self.average,
    }
  }
}
