//! Integration tests for `SqliteStore` against an in-memory database.

use cursus_core::{
  competency::{Evaluation, NewCompetency, NewParcours, Upsert},
  department::NewDepartment,
  enrollment::{EnrollmentKey, EnrollmentOutcome, NewEnrollment},
  ids::{DecisionId, ProgramId, StudentId},
  program::{ProgramKey, ProgramYear},
  reference::{DECISION_SEED, EnrollmentState, Rhythm},
  session::SyncSession,
  store::{AcademicStore, CohortQuery, EvaluationRecord},
};
use pretty_assertions::assert_eq;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Seed the static tables and one department with a single program.
fn seed(session: &mut dyn SyncSession<Error = Error>) -> Result<ProgramId, Error> {
  session.ensure_rhythm(Rhythm::FullTime)?;
  session.ensure_rhythm(Rhythm::WorkStudy)?;
  session.ensure_enrollment_state(EnrollmentState::Enrolled)?;
  session.ensure_enrollment_state(EnrollmentState::Withdrawn)?;
  for (name, acronym) in DECISION_SEED {
    session.ensure_decision(name, acronym)?;
  }
  let dept = session
    .ensure_department(&NewDepartment::new(3, "Génie électrique", "GEII"))?
    .expect("fresh department");
  let program = session.ensure_program(ProgramKey::new(
    ProgramYear::FIRST,
    dept.id,
    Rhythm::FullTime,
  ))?;
  Ok(program.id)
}

fn enrollment(
  student: StudentId,
  program: ProgramId,
  decision: Option<DecisionId>,
) -> NewEnrollment {
  NewEnrollment {
    academic_year: 2022,
    student,
    state: EnrollmentState::Enrolled,
    program,
    decision,
  }
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reference_seeding_is_idempotent() {
  let s = store().await;

  let first = s
    .transaction(|session| {
      let rhythms = [Rhythm::FullTime, Rhythm::WorkStudy]
        .into_iter()
        .map(|r| session.ensure_rhythm(r))
        .collect::<Result<Vec<_>, _>>()?;
      Ok(rhythms.into_iter().filter(|inserted| *inserted).count())
    })
    .await
    .unwrap();
  assert_eq!(first, 2);

  let second = s
    .transaction(|session| session.ensure_rhythm(Rhythm::FullTime))
    .await
    .unwrap();
  assert!(!second);
}

#[tokio::test]
async fn every_seeded_decision_resolves_once() {
  let s = store().await;
  s.transaction(|session| seed(session).map(drop)).await.unwrap();

  let ids = s.transaction(|session| session.decision_ids()).await.unwrap();
  assert_eq!(ids.len(), DECISION_SEED.len());
  for (_, acronym) in DECISION_SEED {
    assert!(ids.contains_key(*acronym), "missing {acronym}");
  }
}

#[tokio::test]
async fn ensure_decision_normalizes_acronym() {
  let s = store().await;
  let (a, b) = s
    .transaction(|session| {
      let a = session.ensure_decision("Admis", "adm ")?;
      let b = session.ensure_decision("Admis", "ADM")?;
      Ok((a, b))
    })
    .await
    .unwrap();
  assert!(a.inserted);
  assert!(!b.inserted);
  assert_eq!(a.id, b.id);
}

// ─── Departments and programs ────────────────────────────────────────────────

#[tokio::test]
async fn department_id_collision_is_reported() {
  let s = store().await;
  let outcome = s
    .transaction(|session| {
      session.ensure_department(&NewDepartment::new(1, "Carrières juridiques", "CJ"))?;
      session.ensure_department(&NewDepartment::new(1, "Autre", "XYZ"))
    })
    .await
    .unwrap();
  assert!(outcome.is_none());
}

#[tokio::test]
async fn program_triple_is_unique() {
  let s = store().await;
  let (first, again, count) = s
    .transaction(|session| {
      let first = seed(session)?;
      let dept = session.departments()?[0].id;
      let again =
        session.ensure_program(ProgramKey::new(ProgramYear::FIRST, dept, Rhythm::FullTime))?;
      Ok((first, again, session.programs()?.len()))
    })
    .await
    .unwrap();
  assert_eq!(first, again.id);
  assert!(!again.inserted);
  assert_eq!(count, 1);
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_enrollment_is_not_duplicated() {
  let s = store().await;
  let outcomes = s
    .transaction(|session| {
      let program = seed(session)?;
      let student = session.ensure_student("123")?.id;
      let row = enrollment(student, program, None);
      let a = session.insert_enrollment(&row, EnrollmentKey::default())?;
      let b = session.insert_enrollment(&row, EnrollmentKey::default())?;
      Ok((a, b))
    })
    .await
    .unwrap();
  assert!(matches!(outcomes.0, EnrollmentOutcome::Inserted(_)));
  assert_eq!(outcomes.1, EnrollmentOutcome::Existing(outcomes.0.id()));
}

#[tokio::test]
async fn differing_outcome_is_a_conflict_under_logical_key() {
  let s = store().await;
  let outcome = s
    .transaction(|session| {
      let program = seed(session)?;
      let decisions = session.decision_ids()?;
      let student = session.ensure_student("123")?.id;
      session.insert_enrollment(
        &enrollment(student, program, Some(decisions["ADM"])),
        EnrollmentKey::StudentYearProgram,
      )?;
      session.insert_enrollment(
        &enrollment(student, program, Some(decisions["AJ"])),
        EnrollmentKey::StudentYearProgram,
      )
    })
    .await
    .unwrap();
  assert!(matches!(outcome, EnrollmentOutcome::Conflict(_)));
}

#[tokio::test]
async fn full_row_key_allows_differing_outcomes() {
  let s = store().await;
  let (second, null_again) = s
    .transaction(|session| {
      let program = seed(session)?;
      let decisions = session.decision_ids()?;
      let student = session.ensure_student("123")?.id;
      session.insert_enrollment(
        &enrollment(student, program, None),
        EnrollmentKey::FullRow,
      )?;
      let second = session.insert_enrollment(
        &enrollment(student, program, Some(decisions["AJ"])),
        EnrollmentKey::FullRow,
      )?;
      let null_again = session.insert_enrollment(
        &enrollment(student, program, None),
        EnrollmentKey::FullRow,
      )?;
      Ok((second, null_again))
    })
    .await
    .unwrap();
  assert!(matches!(second, EnrollmentOutcome::Inserted(_)));
  // A null decision compares equal to a null decision.
  assert!(matches!(null_again, EnrollmentOutcome::Existing(_)));
}

// ─── Evaluations ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn evaluation_upsert_replaces_previous_row() {
  let s = store().await;
  let (first, second) = s
    .transaction(|session| {
      let program = seed(session)?;
      let dept = session.departments()?[0].id;
      let student = session.ensure_student("123")?.id;
      let enrollment_id = session
        .insert_enrollment(&enrollment(student, program, None), EnrollmentKey::default())?
        .id();
      let parcours = session.ensure_parcours(&NewParcours::common_core(dept))?.id;
      let competency = session
        .ensure_competency(&NewCompetency {
          parcours,
          code: "C1".into(),
          label: "Réaliser".into(),
        })?
        .id;

      let mut evaluation = Evaluation {
        enrollment: enrollment_id,
        competency,
        decision: None,
        average: Some(9.5),
      };
      let first = session.upsert_evaluation(&evaluation)?;
      evaluation.average = Some(12.25);
      let second = session.upsert_evaluation(&evaluation)?;
      Ok((first, second))
    })
    .await
    .unwrap();
  assert_eq!(first, Upsert::Inserted);
  assert_eq!(second, Upsert::Replaced);
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_transaction_rolls_back_every_write() {
  let s = store().await;

  let err = s
    .transaction(|session| {
      seed(session)?;
      session.ensure_student("123")?;
      Err::<(), _>(Error::Core(cursus_core::Error::InvalidProgramYear(9)))
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(_)));

  let readiness = s.readiness().await.unwrap();
  assert_eq!(readiness.departments, 0);
  assert!(!readiness.ready);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn readiness_requires_departments_and_enrollments() {
  let s = store().await;
  s.transaction(|session| seed(session).map(drop)).await.unwrap();
  let readiness = s.readiness().await.unwrap();
  assert_eq!(readiness.departments, 1);
  assert!(!readiness.ready);

  s.transaction(|session| {
    let program = session.programs()?[0].id;
    let student = session.ensure_student("123")?.id;
    session.insert_enrollment(&enrollment(student, program, None), EnrollmentKey::default())?;
    Ok(())
  })
  .await
  .unwrap();
  assert!(s.readiness().await.unwrap().ready);
}

#[tokio::test]
async fn cohort_search_follows_program_years() {
  let s = store().await;
  s.transaction(|session| {
    seed(session)?;
    let dept = session.departments()?[0].id;
    let second = session
      .ensure_program(ProgramKey::new(ProgramYear::SECOND, dept, Rhythm::WorkStudy))?
      .id;
    let first = session.programs()?[0].id;
    let adm = session.decision_ids()?["ADM"];
    let student = session.ensure_student("abc")?.id;

    // Started in 2021: first year in 2021, second year in 2022.
    let mut row = enrollment(student, first, Some(adm));
    row.academic_year = 2021;
    session.insert_enrollment(&row, EnrollmentKey::default())?;
    row.program = second;
    row.academic_year = 2022;
    session.insert_enrollment(&row, EnrollmentKey::default())?;
    // Not part of the 2021 cohort: second year in 2021.
    row.academic_year = 2021;
    session.insert_enrollment(&row, EnrollmentKey::default())?;
    Ok(())
  })
  .await
  .unwrap();

  let rows = s
    .search_cohort(&CohortQuery { start_year: 2021, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].program_year, 1);
  assert_eq!(rows[1].program_year, 2);
  assert_eq!(rows[1].rhythm, "FA");
  assert_eq!(rows[0].decision.as_deref(), Some("ADM"));

  let work_study = s
    .search_cohort(&CohortQuery {
      start_year: 2021,
      department: Some("geii".into()),
      rhythm: Some(Rhythm::WorkStudy),
    })
    .await
    .unwrap();
  assert_eq!(work_study.len(), 1);

  assert_eq!(s.list_academic_years().await.unwrap(), vec![2021, 2022]);
  assert_eq!(s.list_departments().await.unwrap()[0].acronym, "GEII");
}

#[tokio::test]
async fn student_history_groups_evaluations_by_enrollment() {
  let s = store().await;
  s.transaction(|session| {
    let first = seed(session)?;
    let dept = session.departments()?[0].id;
    let second = session
      .ensure_program(ProgramKey::new(ProgramYear::SECOND, dept, Rhythm::WorkStudy))?
      .id;
    let decisions = session.decision_ids()?;
    let student = session.ensure_student("ab12")?.id;

    let mut row = enrollment(student, first, Some(decisions["ADM"]));
    row.academic_year = 2021;
    let year_one = session.insert_enrollment(&row, EnrollmentKey::default())?.id();
    row.program = second;
    row.academic_year = 2022;
    row.decision = None;
    session.insert_enrollment(&row, EnrollmentKey::default())?;

    let parcours = session.ensure_parcours(&NewParcours::common_core(dept))?.id;
    for (code, label, average) in [("C2", "Concevoir", 11.0), ("C1", "Réaliser", 14.5)] {
      let competency = session
        .ensure_competency(&NewCompetency { parcours, code: code.into(), label: label.into() })?
        .id;
      session.upsert_evaluation(&Evaluation {
        enrollment: year_one,
        competency,
        decision: Some(decisions["ADM"]),
        average: Some(average),
      })?;
    }
    Ok(())
  })
  .await
  .unwrap();

  let history = s.student_history(" AB12 ").await.unwrap().expect("stored student");
  assert_eq!(history.ine, "ab12");
  assert_eq!(history.enrollments.len(), 2);

  let first = &history.enrollments[0];
  assert_eq!((first.academic_year, first.program_year), (2021, 1));
  assert_eq!((first.department.as_str(), first.rhythm.as_str()), ("GEII", "FI"));
  assert_eq!(first.state, "I");
  assert_eq!(first.decision.as_deref(), Some("ADM"));
  assert_eq!(first.evaluations, vec![
    EvaluationRecord {
      parcours:   "TC".into(),
      competency: "C1".into(),
      label:      "Réaliser".into(),
      decision:   Some("ADM".into()),
      average:    Some(14.5),
    },
    EvaluationRecord {
      parcours:   "TC".into(),
      competency: "C2".into(),
      label:      "Concevoir".into(),
      decision:   Some("ADM".into()),
      average:    Some(11.0),
    },
  ]);

  let second = &history.enrollments[1];
  assert_eq!((second.academic_year, second.program_year), (2022, 2));
  assert_eq!(second.rhythm, "FA");
  assert_eq!(second.decision, None);
  assert!(second.evaluations.is_empty());

  assert_eq!(s.student_history("unknown").await.unwrap(), None);
  assert_eq!(s.student_history("  ").await.unwrap(), None);
}
