//! [`SqliteStore`]: the SQLite implementation of [`AcademicStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::{OptionalExtension as _, params};

use cursus_core::{
  department::{Department, normalize_acronym},
  enrollment::normalize_ine,
  session::SyncSession,
  store::{AcademicStore, CohortQuery, CohortRow, EvaluationRecord, Readiness, StudentHistory},
};

use crate::{
  Error, Result,
  encode::{
    RawCohortRow, RawDepartment, RawEnrollmentRecord, RawEvaluationRecord, decode_count,
  },
  schema::SCHEMA,
  session::SqliteSession,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cursus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection thread, so transactions never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AcademicStore impl ──────────────────────────────────────────────────────

impl AcademicStore for SqliteStore {
  type Error = Error;

  async fn transaction<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn SyncSession<Error = Error>) -> Result<T> + Send + 'static,
  {
    let outcome: Result<T> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let result = f(&mut SqliteSession::new(&tx));
        match result {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(e) => {
            tracing::warn!(error = %e, "rolling back transaction");
            tx.rollback()?;
            Ok(Err(e))
          }
        }
      })
      .await?;
    outcome
  }

  async fn readiness(&self) -> Result<Readiness> {
    let readiness = self
      .conn
      .call(|conn| {
        let count = |table: &str| {
          conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get::<_, i64>(0))
        };
        // A missing table means the store was never initialised.
        Ok(match (count("departments"), count("enrollments")) {
          (Ok(d), Ok(e)) => Readiness::from_counts(decode_count(d), decode_count(e)),
          _ => Readiness::not_ready(),
        })
      })
      .await?;
    Ok(readiness)
  }

  async fn list_departments(&self) -> Result<Vec<Department>> {
    let raws: Vec<RawDepartment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT department_id, name, acronym FROM departments ORDER BY acronym")?;
        let rows = stmt
          .query_map([], RawDepartment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawDepartment::into_department).collect())
  }

  async fn list_academic_years(&self) -> Result<Vec<i32>> {
    let years = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT academic_year FROM enrollments ORDER BY academic_year",
        )?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<i32>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(years)
  }

  async fn search_cohort(&self, query: &CohortQuery) -> Result<Vec<CohortRow>> {
    let start_year = query.start_year;
    let department = query.department.as_deref().map(normalize_acronym);
    let rhythm_id = query.rhythm.map(|r| r.id());

    let raws: Vec<RawCohortRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             s.ine, e.academic_year, p.program_year,
             dec.acronym, dep.acronym, r.acronym
           FROM enrollments e
           JOIN programs    p   ON e.program_id    = p.program_id
           JOIN departments dep ON p.department_id = dep.department_id
           JOIN students    s   ON e.student_id    = s.student_id
           JOIN rhythms     r   ON p.rhythm_id     = r.rhythm_id
           LEFT JOIN decisions dec ON e.decision_id = dec.decision_id
           WHERE e.academic_year = ?1 + (p.program_year - 1)
             AND (?2 IS NULL OR dep.acronym = ?2)
             AND (?3 IS NULL OR p.rhythm_id = ?3)
           ORDER BY s.ine, e.academic_year",
        )?;
        let rows = stmt
          .query_map(params![start_year, department, rhythm_id], RawCohortRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCohortRow::into_row).collect()
  }

  async fn student_history(&self, ine: &str) -> Result<Option<StudentHistory>> {
    let Some(ine) = normalize_ine(ine) else {
      return Ok(None);
    };
    let lookup = ine.clone();

    let raws = self
      .conn
      .call(move |conn| {
        let student: Option<i64> = conn
          .query_row("SELECT student_id FROM students WHERE ine = ?1", [&lookup], |r| r.get(0))
          .optional()?;
        let Some(student) = student else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT
             e.enrollment_id, e.academic_year, p.program_year,
             dep.acronym, r.acronym, st.acronym, dec.acronym
           FROM enrollments e
           JOIN programs          p   ON e.program_id    = p.program_id
           JOIN departments       dep ON p.department_id = dep.department_id
           JOIN rhythms           r   ON p.rhythm_id     = r.rhythm_id
           JOIN enrollment_states st  ON e.state_id      = st.state_id
           LEFT JOIN decisions dec ON e.decision_id = dec.decision_id
           WHERE e.student_id = ?1
           ORDER BY e.academic_year, p.program_year, e.enrollment_id",
        )?;
        let enrollments = stmt
          .query_map([student], RawEnrollmentRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT
             ev.enrollment_id, pa.code, c.code, c.label, dec.acronym, ev.average
           FROM evaluations ev
           JOIN enrollments  e  ON ev.enrollment_id = e.enrollment_id
           JOIN competencies c  ON ev.competency_id = c.competency_id
           JOIN parcours     pa ON c.parcours_id    = pa.parcours_id
           LEFT JOIN decisions dec ON ev.decision_id = dec.decision_id
           WHERE e.student_id = ?1
           ORDER BY ev.enrollment_id, pa.code, c.code",
        )?;
        let evaluations = stmt
          .query_map([student], RawEvaluationRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((enrollments, evaluations)))
      })
      .await?;

    let Some((enrollments, evaluations)) = raws else {
      return Ok(None);
    };

    let mut by_enrollment: HashMap<i64, Vec<EvaluationRecord>> = HashMap::new();
    for raw in evaluations {
      by_enrollment.entry(raw.enrollment_id).or_default().push(raw.into_record());
    }
    let enrollments = enrollments
      .into_iter()
      .map(|raw| {
        let evaluations = by_enrollment.remove(&raw.enrollment_id).unwrap_or_default();
        raw.into_record(evaluations)
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(StudentHistory { ine, enrollments }))
  }
}
