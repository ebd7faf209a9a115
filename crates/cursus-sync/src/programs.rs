//! Program (formation) synthesis.
//!
//! Which (year, department, rhythm) triples exist is derived, never given.
//! Both derivations go through [`Resolver::ensure_program`], so a triple is
//! written at most once whichever source produced it.

use std::collections::HashMap;

use cursus_core::{
  department::is_bridge,
  ids::{DepartmentId, ProgramId},
  program::{ProgramKey, ProgramYear},
  reference::Rhythm,
  session::{SessionError, SyncSession},
  stats::SyncStats,
};
use tracing::debug;

use crate::{resolver::Resolver, rules::RuleSet, source::ProgramRecord};

/// External program id → local program, for the importers.
#[derive(Debug, Clone, Default)]
pub struct ProgramCatalog {
  by_external: HashMap<i64, (ProgramId, ProgramKey)>,
}

impl ProgramCatalog {
  pub fn get(&self, external_id: i64) -> Option<(ProgramId, ProgramKey)> {
    self.by_external.get(&external_id).copied()
  }

  pub fn len(&self) -> usize { self.by_external.len() }

  pub fn is_empty(&self) -> bool { self.by_external.is_empty() }
}

/// The triples the rule table implies for one ordinary department.
pub fn rule_keys(rules: &RuleSet, department: DepartmentId, acronym: &str) -> Vec<ProgramKey> {
  let mut keys: Vec<_> = ProgramYear::ALL
    .into_iter()
    .map(|year| ProgramKey::new(year, department, Rhythm::FullTime))
    .collect();
  if let Some(start) = rules.work_study_start(acronym) {
    keys.extend(
      ProgramYear::ALL
        .into_iter()
        .filter(|year| *year >= start)
        .map(|year| ProgramKey::new(year, department, Rhythm::WorkStudy)),
    );
  }
  keys
}

/// Rule-based synthesis over every known department.
///
/// Ordinary departments get full-time years 1 to 3 plus work-study years
/// from their configured start. Bridge departments get exactly year 2,
/// full-time.
pub fn synthesize_from_rules<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  resolver: &mut Resolver,
  rules: &RuleSet,
  stats: &mut SyncStats,
) -> Result<(), E> {
  let keys: Vec<ProgramKey> = resolver
    .departments()
    .flat_map(|(acronym, id)| {
      if is_bridge(acronym) {
        vec![ProgramKey::new(ProgramYear::SECOND, id, Rhythm::FullTime)]
      } else {
        rule_keys(rules, id, acronym)
      }
    })
    .collect();

  for key in keys {
    if resolver.ensure_program(session, key)?.inserted {
      stats.formations += 1;
    }
  }
  Ok(())
}

/// Title-derived synthesis over externally listed programs.
///
/// Programs whose department is unknown locally are skipped.
pub fn synthesize_from_titles<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  resolver: &mut Resolver,
  rules: &RuleSet,
  records: &[ProgramRecord],
  stats: &mut SyncStats,
) -> Result<ProgramCatalog, E> {
  let mut catalog = ProgramCatalog::default();

  for record in records {
    let department = DepartmentId(record.department);
    if resolver.department_acronym(department).is_none() {
      debug!(program = record.external_id, department = record.department, "unknown department");
      continue;
    }

    let year = rules.year_for_title(&record.title);
    let rhythm = record.rhythm_hint.unwrap_or_else(|| rules.rhythm_for_title(&record.title));
    let key = ProgramKey::new(year, department, rhythm);

    let ensured = resolver.ensure_program(session, key)?;
    if ensured.inserted {
      stats.formations += 1;
    }
    catalog.by_external.insert(record.external_id, (ensured.id, key));
  }
  Ok(catalog)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn rule_keys_honour_work_study_start() {
    let rules = RuleSet::default();
    let years = |acronym, rhythm| {
      rule_keys(&rules, DepartmentId(1), acronym)
        .into_iter()
        .filter(|k| k.rhythm == rhythm)
        .map(|k| k.year.get())
        .collect::<Vec<_>>()
    };

    assert_eq!(years("GEA", Rhythm::FullTime), [1, 2, 3]);
    assert_eq!(years("GEA", Rhythm::WorkStudy), [1, 2, 3]);
    assert_eq!(years("CJ", Rhythm::WorkStudy), [3]);
    assert_eq!(years("GEII", Rhythm::WorkStudy), [2, 3]);
    assert_eq!(years("MMI", Rhythm::WorkStudy), Vec::<u8>::new());
  }
}
