//! Competency frameworks and per-student evaluations.

use std::collections::HashMap;

use cursus_core::{
  competency::{Evaluation, NewCompetency, NewParcours, Upsert, competency_code},
  ids::{CompetencyId, EnrollmentId, ParcoursId},
  session::{SessionError, SyncSession},
  stats::SyncStats,
};
use cursus_scodoc::types::JuryRecord;
use tracing::debug;

use crate::{programs::ProgramCatalog, resolver::Resolver, source::FrameworkRecord};

/// External competency id → local competency.
pub type CompetencyMap = HashMap<i64, CompetencyId>;

/// Ensure the parcours and competencies of every framework.
///
/// Frameworks of programs missing from `catalog` are skipped. A competency
/// whose parcours is absent or not part of the framework attaches to the
/// department's common-core parcours.
pub fn import_frameworks<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  catalog: &ProgramCatalog,
  frameworks: &[FrameworkRecord],
  stats: &mut SyncStats,
) -> Result<CompetencyMap, E> {
  let mut competencies = CompetencyMap::new();

  for record in frameworks {
    let Some((_, key)) = catalog.get(record.program) else {
      debug!(program = record.program, "framework of unknown program");
      continue;
    };
    let department = key.department;

    let mut parcours: HashMap<i64, ParcoursId> = HashMap::new();
    for p in &record.framework.parcours {
      let new = NewParcours {
        department,
        code: p.code.trim().to_owned(),
        label: p.libelle.clone().unwrap_or_else(|| p.code.trim().to_owned()),
      };
      let ensured = session.ensure_parcours(&new)?;
      if ensured.inserted {
        stats.parcours += 1;
      }
      parcours.insert(p.id, ensured.id);
    }

    let mut common_core: Option<ParcoursId> = None;
    for c in &record.framework.competences {
      let parcours_id = match c.parcours_id.and_then(|id| parcours.get(&id)) {
        Some(id) => *id,
        None => match common_core {
          Some(id) => id,
          None => {
            let ensured = session.ensure_parcours(&NewParcours::common_core(department))?;
            if ensured.inserted {
              stats.parcours += 1;
            }
            common_core = Some(ensured.id);
            ensured.id
          }
        },
      };

      let code = competency_code(c.numero);
      let new = NewCompetency {
        parcours: parcours_id,
        label: c.titre.clone().unwrap_or_else(|| code.clone()),
        code,
      };
      let ensured = session.ensure_competency(&new)?;
      if ensured.inserted {
        stats.competencies += 1;
      }
      competencies.insert(c.id, ensured.id);
    }
  }

  Ok(competencies)
}

/// Upsert one evaluation per competency outcome of `record`. Outcomes for
/// competencies missing from `competencies` are skipped.
pub fn import_evaluations<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  resolver: &mut Resolver,
  competencies: &CompetencyMap,
  enrollment: EnrollmentId,
  record: &JuryRecord,
  register_unknown: bool,
  stats: &mut SyncStats,
) -> Result<(), E> {
  for outcome in record.competency_outcomes() {
    let Some(competency) = competencies.get(&outcome.competency_id).copied() else {
      debug!(competency = outcome.competency_id, "outcome for unknown competency");
      continue;
    };

    let decision = match outcome.code.as_deref() {
      Some(code) => resolver.ensure_decision(session, code, register_unknown)?,
      None => None,
    };
    if decision.is_some_and(|d| d.inserted) {
      stats.decisions += 1;
    }

    let evaluation = Evaluation {
      enrollment,
      competency,
      decision: decision.map(|d| d.id),
      average: outcome.average,
    };
    match session.upsert_evaluation(&evaluation)? {
      Upsert::Inserted => stats.evaluations += 1,
      Upsert::Replaced => stats.evaluations_updated += 1,
    }
  }
  Ok(())
}
