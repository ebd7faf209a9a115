//! ScoDoc API adapter.

use std::ops::RangeInclusive;

use chrono::Datelike as _;
use cursus_core::department::NewDepartment;
use cursus_scodoc::ScoDocApi;
use tracing::{info, warn};

use super::{
  FrameworkRecord, ProgramHint, ProgramPlan, ProgramRecord, SourceAdapter, SourceKind,
  SourceUnit, SyncBatch,
};
use crate::error::{Result, SyncError};

/// Academic years synced when none are configured: the current calendar
/// year and the three before it.
pub fn recent_years() -> RangeInclusive<i32> {
  let now = chrono::Local::now().year();
  (now - 3)..=now
}

pub struct ScoDocSource<'a, C> {
  client: &'a C,
  years:  RangeInclusive<i32>,
}

impl<'a, C: ScoDocApi> ScoDocSource<'a, C> {
  pub fn new(client: &'a C) -> Self { Self { client, years: recent_years() } }

  pub fn with_years(mut self, first: Option<i32>, last: Option<i32>) -> Self {
    let first = first.unwrap_or(*self.years.start());
    let last = last.unwrap_or(*self.years.end());
    self.years = first..=last;
    self
  }
}

/// Turn a failed call into an empty result plus a collected message.
fn recover<T: Default>(
  errors: &mut Vec<String>,
  what: String,
  result: cursus_scodoc::Result<T>,
) -> T {
  result.unwrap_or_else(|e| {
    warn!(error = %e, "{what} failed");
    errors.push(format!("{what}: {e}"));
    T::default()
  })
}

impl<C: ScoDocApi> SourceAdapter for ScoDocSource<'_, C> {
  fn kind(&self) -> SourceKind { SourceKind::ScoDoc }

  async fn gather(&self) -> Result<SyncBatch> {
    let connectivity = self.client.test_connectivity().await;
    if !connectivity.ok {
      return Err(SyncError::Connectivity(connectivity.message));
    }
    info!(message = %connectivity.message, "ScoDoc reachable");

    let mut errors = Vec::new();

    let api_departments = recover(
      &mut errors,
      "listing departments".to_owned(),
      self.client.list_departments().await,
    );
    let departments: Vec<NewDepartment> = api_departments
      .iter()
      .map(|d| NewDepartment::new(d.id, d.display_name(), &d.acronym))
      .collect();

    let mut programs = Vec::new();
    for department in &api_departments {
      let listed = recover(
        &mut errors,
        format!("listing programs of department {}", department.acronym),
        self.client.list_programs(Some(department.id)).await,
      );
      programs.extend(listed.into_iter().map(|p| ProgramRecord {
        external_id: p.id,
        department:  p.dept_id.unwrap_or(department.id),
        title:       p.title(),
        rhythm_hint: p.rhythm_hint(),
      }));
    }

    let mut frameworks = Vec::new();
    for program in &programs {
      let framework = recover(
        &mut errors,
        format!("fetching competency framework of program {}", program.external_id),
        self.client.list_competency_framework(program.external_id).await,
      );
      if let Some(framework) = framework {
        frameworks.push(FrameworkRecord { program: program.external_id, framework });
      }
    }

    let mut units = Vec::new();
    for year in self.years.clone() {
      let terms = recover(
        &mut errors,
        format!("querying terms of {year}"),
        self.client.query_terms_for_year(year).await,
      );
      for term in terms {
        let records = recover(
          &mut errors,
          format!("listing jury decisions of term {}", term.id),
          self.client.list_jury_decisions(term.id).await,
        );
        units.push(SourceUnit {
          label: format!("formsemestre {}", term.id),
          academic_year: term.academic_year().or(Some(year)),
          program: ProgramHint::External(term.formation_id),
          records,
        });
      }
    }

    Ok(SyncBatch {
      kind: SourceKind::ScoDoc,
      departments,
      programs: ProgramPlan::Titles(programs),
      frameworks,
      units,
      errors,
    })
  }
}
