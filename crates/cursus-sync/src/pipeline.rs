//! The orchestrator.
//!
//! A run gathers a [`SyncBatch`] from its source, then applies it inside one
//! store transaction. Any store error rolls the whole run back; everything
//! else is counted in the returned [`SyncStats`].

use std::fmt;

use cursus_core::{
  enrollment::EnrollmentKey,
  session::{SessionError, SyncSession},
  stats::SyncStats,
  store::AcademicStore,
};
use tracing::{Instrument as _, debug, error, info, info_span, warn};

use crate::{
  enrollments::{ImportOptions, import_unit},
  error::{Result, SyncError},
  evaluations::{import_evaluations, import_frameworks},
  programs::{ProgramCatalog, synthesize_from_rules, synthesize_from_titles},
  reference,
  resolver::Resolver,
  rules::RuleSet,
  source::{ProgramPlan, SourceAdapter, SyncBatch},
};

/// Knobs for a run.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
  pub rules:                      RuleSet,
  pub enrollment_key:             EnrollmentKey,
  /// Register decision codes missing from the store instead of leaving the
  /// enrollment's decision empty.
  pub register_unknown_decisions: bool,
}

// ─── Stages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStage {
  Idle,
  ReferenceDataSeeded,
  DepartmentsImported,
  ProgramsSynthesized,
  EnrollmentsImported { unit: String },
  EvaluationsImported { unit: String },
  Committed,
  Aborted,
}

impl fmt::Display for SyncStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Idle => f.write_str("idle"),
      Self::ReferenceDataSeeded => f.write_str("reference data seeded"),
      Self::DepartmentsImported => f.write_str("departments imported"),
      Self::ProgramsSynthesized => f.write_str("programs synthesized"),
      Self::EnrollmentsImported { unit } => write!(f, "enrollments imported ({unit})"),
      Self::EvaluationsImported { unit } => write!(f, "evaluations imported ({unit})"),
      Self::Committed => f.write_str("committed"),
      Self::Aborted => f.write_str("aborted"),
    }
  }
}

struct Progress {
  stage: SyncStage,
}

impl Progress {
  fn advance(&mut self, next: SyncStage) {
    match next {
      SyncStage::EnrollmentsImported { .. } | SyncStage::EvaluationsImported { .. } => {
        debug!(from = %self.stage, to = %next, "sync stage");
      }
      _ => info!(from = %self.stage, to = %next, "sync stage"),
    }
    self.stage = next;
  }
}

// ─── Apply ───────────────────────────────────────────────────────────────────

/// Apply `batch` through `session`. Meant to run inside
/// [`AcademicStore::transaction`]; an `Err` means the transaction must be
/// rolled back.
pub fn apply<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  batch: &SyncBatch,
  settings: &SyncSettings,
) -> Result<SyncStats, E> {
  let mut progress = Progress { stage: SyncStage::Idle };
  let result = apply_stages(session, batch, settings, &mut progress);
  if result.is_err() {
    progress.advance(SyncStage::Aborted);
  }
  result
}

fn apply_stages<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  batch: &SyncBatch,
  settings: &SyncSettings,
  progress: &mut Progress,
) -> Result<SyncStats, E> {
  let mut stats = SyncStats { errors: batch.errors.clone(), ..SyncStats::default() };

  reference::seed(session, &mut stats)?;
  progress.advance(SyncStage::ReferenceDataSeeded);

  let mut resolver = Resolver::load(session)?;
  for department in &batch.departments {
    match resolver.ensure_department(session, department)? {
      Some(ensured) if ensured.inserted => stats.departments += 1,
      Some(_) => {}
      None => {
        let message = format!(
          "department {} ({}) not imported: id already used by another department",
          department.acronym, department.id,
        );
        warn!("{message}");
        stats.errors.push(message);
      }
    }
  }
  progress.advance(SyncStage::DepartmentsImported);

  let catalog = match &batch.programs {
    ProgramPlan::Rules => {
      synthesize_from_rules(session, &mut resolver, &settings.rules, &mut stats)?;
      ProgramCatalog::default()
    }
    ProgramPlan::Titles(records) => {
      synthesize_from_titles(session, &mut resolver, &settings.rules, records, &mut stats)?
    }
  };
  progress.advance(SyncStage::ProgramsSynthesized);

  let competencies = import_frameworks(session, &catalog, &batch.frameworks, &mut stats)?;

  let options = ImportOptions {
    key:              settings.enrollment_key,
    register_unknown: settings.register_unknown_decisions,
  };
  for unit in &batch.units {
    let imported = import_unit(session, &mut resolver, &catalog, unit, options, &mut stats)?;
    progress.advance(SyncStage::EnrollmentsImported { unit: unit.label.clone() });

    if competencies.is_empty() {
      continue;
    }
    for item in imported {
      let Some(record) = unit.records.get(item.record) else { continue };
      import_evaluations(
        session,
        &mut resolver,
        &competencies,
        item.enrollment,
        record,
        options.register_unknown,
        &mut stats,
      )?;
    }
    progress.advance(SyncStage::EvaluationsImported { unit: unit.label.clone() });
  }

  stats.students_total = resolver.students_seen();
  Ok(stats)
}

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Gather from `source` and apply to `store` in one transaction.
pub async fn run<S, A>(store: &S, source: &A, settings: &SyncSettings) -> Result<SyncStats>
where
  S: AcademicStore,
  A: SourceAdapter,
{
  let span = info_span!("sync", source = %source.kind());
  async move {
    let batch = match source.gather().await {
      Ok(batch) => batch,
      Err(e) => {
        error!(error = %e, stage = %SyncStage::Aborted, "gathering failed");
        return Err(e);
      }
    };
    info!(
      departments = batch.departments.len(),
      units = batch.units.len(),
      records = batch.units.iter().map(|u| u.records.len()).sum::<usize>(),
      "source gathered"
    );

    let settings = settings.clone();
    let stats = store
      .transaction(move |session| apply(session, &batch, &settings))
      .await
      .map_err(|e| {
        error!(error = %e, "sync rolled back");
        SyncError::Store(Box::new(e))
      })?;

    info!(
      stage = %SyncStage::Committed,
      counts = ?stats.counts(),
      errors = stats.errors.len(),
      "sync committed"
    );
    Ok(stats)
  }
  .instrument(span)
  .await
}
