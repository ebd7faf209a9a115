//! [`SqliteSession`]: the SQLite implementation of [`SyncSession`].

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension as _, params};

use cursus_core::{
  competency::{Evaluation, NewCompetency, NewParcours, Upsert},
  department::{Department, NewDepartment},
  enrollment::{EnrollmentKey, EnrollmentOutcome, NewEnrollment},
  ids::{
    CompetencyId, DecisionId, DepartmentId, EnrollmentId, ParcoursId, ProgramId, StudentId,
  },
  program::{Program, ProgramKey},
  reference::{EnrollmentState, Rhythm, normalize_code},
  session::{Ensured, SyncSession},
};

use crate::{
  Error, Result,
  encode::{RawDepartment, RawProgram},
};

/// Write handle over a connection that is already inside a transaction.
///
/// Constructed by [`crate::SqliteStore`]; never commits or rolls back
/// itself.
pub struct SqliteSession<'a> {
  conn: &'a Connection,
}

impl<'a> SqliteSession<'a> {
  pub(crate) fn new(conn: &'a Connection) -> Self { Self { conn } }

  /// Look up a single integer id; `None` when no row matches.
  fn find_id<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Option<i64>> {
    Ok(self.conn.query_row(sql, params, |r| r.get(0)).optional()?)
  }
}

impl SyncSession for SqliteSession<'_> {
  type Error = Error;

  // ── Reference data ──────────────────────────────────────────────────────

  fn ensure_rhythm(&mut self, rhythm: Rhythm) -> Result<bool> {
    let n = self.conn.execute(
      "INSERT OR IGNORE INTO rhythms (rhythm_id, name, acronym) VALUES (?1, ?2, ?3)",
      params![rhythm.id(), rhythm.name(), rhythm.acronym()],
    )?;
    Ok(n > 0)
  }

  fn ensure_enrollment_state(&mut self, state: EnrollmentState) -> Result<bool> {
    let n = self.conn.execute(
      "INSERT OR IGNORE INTO enrollment_states (state_id, name, acronym) VALUES (?1, ?2, ?3)",
      params![state.id(), state.name(), state.acronym()],
    )?;
    Ok(n > 0)
  }

  fn ensure_decision(&mut self, name: &str, acronym: &str) -> Result<Ensured<DecisionId>> {
    let acronym = normalize_code(acronym);
    if let Some(id) =
      self.find_id("SELECT decision_id FROM decisions WHERE acronym = ?1", params![acronym])?
    {
      return Ok(Ensured::existing(DecisionId(id)));
    }

    self.conn.execute(
      "INSERT INTO decisions (name, acronym) VALUES (?1, ?2)",
      params![name, acronym],
    )?;
    Ok(Ensured::inserted(DecisionId(self.conn.last_insert_rowid())))
  }

  fn decision_ids(&mut self) -> Result<HashMap<String, DecisionId>> {
    let mut stmt = self.conn.prepare("SELECT acronym, decision_id FROM decisions")?;
    let rows = stmt
      .query_map([], |row| Ok((row.get::<_, String>(0)?, DecisionId(row.get(1)?))))?
      .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(rows)
  }

  // ── Departments and programs ────────────────────────────────────────────

  fn ensure_department(
    &mut self,
    department: &NewDepartment,
  ) -> Result<Option<Ensured<DepartmentId>>> {
    if let Some(id) = self.find_id(
      "SELECT department_id FROM departments WHERE acronym = ?1",
      params![department.acronym],
    )? {
      return Ok(Some(Ensured::existing(DepartmentId(id))));
    }

    let n = self.conn.execute(
      "INSERT OR IGNORE INTO departments (department_id, name, acronym) VALUES (?1, ?2, ?3)",
      params![department.id.0, department.name, department.acronym],
    )?;
    if n == 0 {
      // The id belongs to a department with another acronym.
      return Ok(None);
    }
    Ok(Some(Ensured::inserted(department.id)))
  }

  fn departments(&mut self) -> Result<Vec<Department>> {
    let mut stmt = self.conn.prepare(
      "SELECT department_id, name, acronym FROM departments ORDER BY department_id",
    )?;
    let rows = stmt
      .query_map([], RawDepartment::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows.into_iter().map(RawDepartment::into_department).collect())
  }

  fn ensure_program(&mut self, key: ProgramKey) -> Result<Ensured<ProgramId>> {
    let year = i64::from(key.year.get());
    if let Some(id) = self.find_id(
      "SELECT program_id FROM programs
       WHERE program_year = ?1 AND department_id = ?2 AND rhythm_id = ?3",
      params![year, key.department.0, key.rhythm.id()],
    )? {
      return Ok(Ensured::existing(ProgramId(id)));
    }

    self.conn.execute(
      "INSERT INTO programs (program_year, department_id, rhythm_id) VALUES (?1, ?2, ?3)",
      params![year, key.department.0, key.rhythm.id()],
    )?;
    Ok(Ensured::inserted(ProgramId(self.conn.last_insert_rowid())))
  }

  fn programs(&mut self) -> Result<Vec<Program>> {
    let mut stmt = self.conn.prepare(
      "SELECT program_id, program_year, department_id, rhythm_id FROM programs
       ORDER BY program_id",
    )?;
    let raws = stmt
      .query_map([], RawProgram::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawProgram::into_program).collect()
  }

  // ── Students and enrollments ────────────────────────────────────────────

  fn ensure_student(&mut self, ine: &str) -> Result<Ensured<StudentId>> {
    if let Some(id) =
      self.find_id("SELECT student_id FROM students WHERE ine = ?1", params![ine])?
    {
      return Ok(Ensured::existing(StudentId(id)));
    }

    self.conn.execute("INSERT INTO students (ine) VALUES (?1)", params![ine])?;
    Ok(Ensured::inserted(StudentId(self.conn.last_insert_rowid())))
  }

  fn insert_enrollment(
    &mut self,
    enrollment: &NewEnrollment,
    key: EnrollmentKey,
  ) -> Result<EnrollmentOutcome> {
    let decision_id = enrollment.decision.map(|d| d.0);

    match key {
      EnrollmentKey::StudentYearProgram => {
        let existing: Option<(i64, i64, Option<i64>)> = self
          .conn
          .query_row(
            "SELECT enrollment_id, state_id, decision_id FROM enrollments
             WHERE student_id = ?1 AND academic_year = ?2 AND program_id = ?3
             ORDER BY enrollment_id
             LIMIT 1",
            params![enrollment.student.0, enrollment.academic_year, enrollment.program.0],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;

        if let Some((id, state_id, existing_decision)) = existing {
          let id = EnrollmentId(id);
          return Ok(
            if state_id == enrollment.state.id() && existing_decision == decision_id {
              EnrollmentOutcome::Existing(id)
            } else {
              EnrollmentOutcome::Conflict(id)
            },
          );
        }
      }
      EnrollmentKey::FullRow => {
        if let Some(id) = self.find_id(
          "SELECT enrollment_id FROM enrollments
           WHERE student_id = ?1 AND academic_year = ?2 AND program_id = ?3
             AND state_id = ?4 AND decision_id IS ?5
           ORDER BY enrollment_id
           LIMIT 1",
          params![
            enrollment.student.0,
            enrollment.academic_year,
            enrollment.program.0,
            enrollment.state.id(),
            decision_id,
          ],
        )? {
          return Ok(EnrollmentOutcome::Existing(EnrollmentId(id)));
        }
      }
    }

    self.conn.execute(
      "INSERT INTO enrollments (academic_year, student_id, state_id, program_id, decision_id)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        enrollment.academic_year,
        enrollment.student.0,
        enrollment.state.id(),
        enrollment.program.0,
        decision_id,
      ],
    )?;
    Ok(EnrollmentOutcome::Inserted(EnrollmentId(self.conn.last_insert_rowid())))
  }

  // ── Competencies ────────────────────────────────────────────────────────

  fn ensure_parcours(&mut self, parcours: &NewParcours) -> Result<Ensured<ParcoursId>> {
    if let Some(id) = self.find_id(
      "SELECT parcours_id FROM parcours WHERE department_id = ?1 AND code = ?2",
      params![parcours.department.0, parcours.code],
    )? {
      return Ok(Ensured::existing(ParcoursId(id)));
    }

    self.conn.execute(
      "INSERT INTO parcours (department_id, code, label) VALUES (?1, ?2, ?3)",
      params![parcours.department.0, parcours.code, parcours.label],
    )?;
    Ok(Ensured::inserted(ParcoursId(self.conn.last_insert_rowid())))
  }

  fn ensure_competency(&mut self, competency: &NewCompetency) -> Result<Ensured<CompetencyId>> {
    if let Some(id) = self.find_id(
      "SELECT competency_id FROM competencies WHERE parcours_id = ?1 AND code = ?2",
      params![competency.parcours.0, competency.code],
    )? {
      return Ok(Ensured::existing(CompetencyId(id)));
    }

    self.conn.execute(
      "INSERT INTO competencies (parcours_id, code, label) VALUES (?1, ?2, ?3)",
      params![competency.parcours.0, competency.code, competency.label],
    )?;
    Ok(Ensured::inserted(CompetencyId(self.conn.last_insert_rowid())))
  }

  fn upsert_evaluation(&mut self, evaluation: &Evaluation) -> Result<Upsert> {
    let existed = self
      .find_id(
        "SELECT 1 FROM evaluations WHERE enrollment_id = ?1 AND competency_id = ?2",
        params![evaluation.enrollment.0, evaluation.competency.0],
      )?
      .is_some();

    self.conn.execute(
      "INSERT INTO evaluations (enrollment_id, competency_id, decision_id, average)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (enrollment_id, competency_id) DO UPDATE SET
         decision_id = excluded.decision_id,
         average     = excluded.average",
      params![
        evaluation.enrollment.0,
        evaluation.competency.0,
        evaluation.decision.map(|d| d.0),
        evaluation.average,
      ],
    )?;

    Ok(if existed { Upsert::Replaced } else { Upsert::Inserted })
  }
}
