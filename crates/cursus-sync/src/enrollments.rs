//! Enrollment import: one enrollment per classified student record.

use cursus_core::{
  department::is_bridge,
  enrollment::{EnrollmentKey, EnrollmentOutcome, NewEnrollment},
  ids::{DepartmentId, EnrollmentId, ProgramId},
  program::{ProgramKey, ProgramYear},
  reference::Rhythm,
  session::{SessionError, SyncSession},
  stats::SyncStats,
};
use cursus_scodoc::types::JuryRecord;
use tracing::{debug, warn};

use crate::{
  classify::classify,
  programs::ProgramCatalog,
  resolver::Resolver,
  source::{ProgramHint, SourceUnit},
};

/// Options that change how records become rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
  pub key:              EnrollmentKey,
  pub register_unknown: bool,
}

/// An enrollment written (or found) for the record at `record` in its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imported {
  pub record:     usize,
  pub enrollment: EnrollmentId,
}

/// Program year from a level marker such as `"2"` or `"BUT3"`.
pub fn year_from_level_marker(marker: Option<&str>) -> ProgramYear {
  match marker {
    Some(m) if m.contains('3') => ProgramYear::THIRD,
    Some(m) if m.contains('2') => ProgramYear::SECOND,
    _ => ProgramYear::FIRST,
  }
}

/// The unit-level half of program resolution.
enum UnitProgram<'a> {
  Derived {
    department: DepartmentId,
    bridge:     bool,
    rhythm:     Rhythm,
  },
  External(&'a ProgramCatalog, i64),
}

impl UnitProgram<'_> {
  fn resolve(&self, resolver: &Resolver, record: &JuryRecord) -> Option<ProgramId> {
    match *self {
      Self::External(catalog, external) => catalog.get(external).map(|(id, _)| id),
      Self::Derived { department, bridge, rhythm } => {
        let year = if bridge {
          ProgramYear::SECOND
        } else {
          year_from_level_marker(record.level_marker().as_deref())
        };
        let lookup = |year| resolver.program(ProgramKey::new(year, department, rhythm));

        lookup(year).or_else(|| match rhythm {
          Rhythm::WorkStudy => lookup(ProgramYear::SECOND).or_else(|| lookup(ProgramYear::THIRD)),
          Rhythm::FullTime => None,
        })
      }
    }
  }
}

/// Import every record of `unit`.
///
/// Records without an identifier, a derivable decision, an academic year or
/// a resolvable program are skipped and counted. A unit whose department is
/// unknown is skipped whole.
pub fn import_unit<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  resolver: &mut Resolver,
  catalog: &ProgramCatalog,
  unit: &SourceUnit,
  options: ImportOptions,
  stats: &mut SyncStats,
) -> Result<Vec<Imported>, E> {
  let program = match &unit.program {
    ProgramHint::External(id) => UnitProgram::External(catalog, *id),
    ProgramHint::Derived { department, rhythm } => match resolver.department(department) {
      Some(id) => UnitProgram::Derived {
        department: id,
        bridge:     is_bridge(department),
        rhythm:     *rhythm,
      },
      None => {
        warn!(unit = %unit.label, %department, "department not in store; skipping unit");
        stats.enrollments_skipped += unit.records.len() as u64;
        return Ok(Vec::new());
      }
    },
  };

  let mut imported = Vec::new();

  for (index, record) in unit.records.iter().enumerate() {
    let skip = |reason: &str| debug!(unit = %unit.label, record = index, "skipped: {reason}");

    let Some(raw_ine) = record.student_id() else {
      skip("no student identifier");
      stats.enrollments_skipped += 1;
      continue;
    };
    let Some(student) = resolver.ensure_student(session, &raw_ine)? else {
      skip("empty student identifier");
      stats.enrollments_skipped += 1;
      continue;
    };
    if student.inserted {
      stats.students_new += 1;
    }

    let Some(classification) = classify(record) else {
      skip("no decision code");
      stats.enrollments_skipped += 1;
      continue;
    };
    let Some(academic_year) = record.academic_year().or(unit.academic_year) else {
      skip("no academic year");
      stats.enrollments_skipped += 1;
      continue;
    };
    let Some(program_id) = program.resolve(resolver, record) else {
      skip("no matching program");
      stats.enrollments_skipped += 1;
      continue;
    };

    let decision =
      resolver.ensure_decision(session, &classification.code, options.register_unknown)?;
    if decision.is_some_and(|d| d.inserted) {
      stats.decisions += 1;
    }

    let enrollment = NewEnrollment {
      academic_year,
      student: student.id,
      state: classification.state,
      program: program_id,
      decision: decision.map(|d| d.id),
    };
    let outcome = session.insert_enrollment(&enrollment, options.key)?;
    match outcome {
      EnrollmentOutcome::Inserted(_) => stats.enrollments += 1,
      EnrollmentOutcome::Existing(_) => {}
      EnrollmentOutcome::Conflict(existing) => {
        let message = format!(
          "{}: student {raw_ine} already enrolled in {academic_year} (enrollment {existing}) \
           with a different outcome; kept the existing row",
          unit.label,
        );
        warn!("{message}");
        stats.conflicts += 1;
        stats.errors.push(message);
      }
    }
    imported.push(Imported { record: index, enrollment: outcome.id() });
  }

  Ok(imported)
}
