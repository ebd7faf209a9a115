//! File-batch adapter: a directory of ScoDoc JSON exports.
//!
//! The directory holds `departements.json` and any number of
//! `decisions_*.json` files. Each decision file's name carries its
//! department, rhythm and academic year.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use cursus_core::department::{BRIDGE_DEPARTMENTS, NewDepartment};
use cursus_scodoc::types::{ApiDepartment, JuryRecord, parse_items, unwrap_listing};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ProgramHint, ProgramPlan, SourceAdapter, SourceKind, SourceUnit, SyncBatch};
use crate::{
  error::{Result, SyncError},
  rules::{NameMatch, RuleSet, year_in_name},
};

pub const DEPARTMENTS_FILE: &str = "departements.json";
const DECISIONS_PREFIX: &str = "decisions_";

pub struct FilesSource {
  dir:   PathBuf,
  rules: RuleSet,
}

impl FilesSource {
  pub fn new(dir: impl Into<PathBuf>, rules: RuleSet) -> Self { Self { dir: dir.into(), rules } }

  pub fn dir(&self) -> &Path { &self.dir }

  async fn load_departments(&self) -> Result<Vec<NewDepartment>> {
    let path = self.dir.join(DEPARTMENTS_FILE);
    let bytes = match tokio::fs::read(&path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Err(SyncError::MissingDepartments(path));
      }
      Err(source) => return Err(SyncError::Io { path, source }),
    };
    let value: Value =
      serde_json::from_slice(&bytes).map_err(|source| SyncError::Json { path, source })?;

    let mut departments: Vec<NewDepartment> =
      parse_items::<ApiDepartment>(unwrap_listing(value, "departements"), "department")
        .into_iter()
        .map(|d| NewDepartment::new(d.id, d.display_name(), &d.acronym))
        .collect();
    departments.extend(BRIDGE_DEPARTMENTS.iter().map(|b| b.to_new()));
    Ok(departments)
  }

  /// Names of the decision files, sorted.
  async fn decision_files(&self) -> Result<Vec<String>> {
    let io_err = |source| SyncError::Io { path: self.dir.clone(), source };
    let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
      let Ok(name) = entry.file_name().into_string() else { continue };
      if name.starts_with(DECISIONS_PREFIX) && name.ends_with(".json") {
        names.push(name);
      }
    }
    names.sort();
    Ok(names)
  }

  async fn read_records(&self, name: &str) -> std::result::Result<Vec<JuryRecord>, String> {
    let bytes = tokio::fs::read(self.dir.join(name))
      .await
      .map_err(|e| format!("{name}: {e}"))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| format!("{name}: {e}"))?;
    Ok(parse_items(unwrap_listing(value, "etudiants"), "jury record"))
  }
}

impl SourceAdapter for FilesSource {
  fn kind(&self) -> SourceKind { SourceKind::Files }

  async fn gather(&self) -> Result<SyncBatch> {
    let departments = self.load_departments().await?;
    let mut units = Vec::new();
    let mut errors = Vec::new();

    for name in self.decision_files().await? {
      let department = match self.rules.department_for_name(&name) {
        NameMatch::Department(acronym) => acronym.to_owned(),
        NameMatch::Unresolved => {
          warn!(file = %name, "no department matches file name; skipping");
          continue;
        }
      };

      let records = match self.read_records(&name).await {
        Ok(records) => records,
        Err(message) => {
          warn!(error = %message, "skipping unreadable decisions file");
          errors.push(message);
          continue;
        }
      };

      let rhythm = self.rules.rhythm_for_name(&name);
      debug!(file = %name, %department, ?rhythm, records = records.len(), "decisions file");
      units.push(SourceUnit {
        academic_year: year_in_name(&name),
        program: ProgramHint::Derived { department, rhythm },
        records,
        label: name,
      });
    }

    Ok(SyncBatch {
      kind: SourceKind::Files,
      departments,
      programs: ProgramPlan::Rules,
      frameworks: Vec::new(),
      units,
      errors,
    })
  }
}

#[cfg(test)]
mod tests {
  use cursus_core::reference::Rhythm;
  use pretty_assertions::assert_eq;

  use super::*;

  fn write(dir: &Path, name: &str, body: &str) { std::fs::write(dir.join(name), body).unwrap(); }

  #[tokio::test]
  async fn missing_departments_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = FilesSource::new(dir.path(), RuleSet::default()).gather().await.unwrap_err();
    assert!(matches!(err, SyncError::MissingDepartments(_)));
  }

  #[tokio::test]
  async fn gathers_units_from_file_names() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), DEPARTMENTS_FILE, r#"[{"id": 3, "dept_name": "GEII", "acronym": "geii"}]"#);
    write(dir.path(), "decisions_geii_2022_fa.json", r#"[{"etudid": "123"}]"#);
    write(dir.path(), "decisions_rt_2021.json", r#"{"etudiants": [{"etudid": 1}, {"etudid": 2}]}"#);
    write(dir.path(), "decisions_mmi_2021.json", "[]");
    write(dir.path(), "decisions_gea_2021.json", "not json");
    write(dir.path(), "notes.json", "[]");

    let batch = FilesSource::new(dir.path(), RuleSet::default()).gather().await.unwrap();

    let acronyms: Vec<_> = batch.departments.iter().map(|d| d.acronym.as_str()).collect();
    assert_eq!(acronyms, ["GEII", "P_SD_INFO", "P_CJ_GEA"]);

    let labels: Vec<_> = batch.units.iter().map(|u| u.label.as_str()).collect();
    assert_eq!(labels, ["decisions_geii_2022_fa.json", "decisions_rt_2021.json"]);

    let geii = &batch.units[0];
    assert_eq!(geii.academic_year, Some(2022));
    assert_eq!(geii.program, ProgramHint::Derived {
      department: "GEII".into(),
      rhythm:     Rhythm::WorkStudy,
    });
    assert_eq!(batch.units[1].records.len(), 2);

    assert_eq!(batch.errors.len(), 1);
    assert!(batch.errors[0].starts_with("decisions_gea_2021.json"));
  }
}
