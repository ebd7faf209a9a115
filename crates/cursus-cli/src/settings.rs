//! Layered configuration: `cursus.toml` under `CURSUS_*` environment
//! variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use cursus_core::{department::default_hidden_departments, enrollment::EnrollmentKey};
use cursus_scodoc::ScoDocConfig;
use cursus_sync::{RuleSet, SyncSettings};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
  #[serde(default = "default_json_dir")]
  pub json_dir:      PathBuf,
  #[serde(default)]
  pub server:        ServerSettings,
  /// Absent when no ScoDoc instance is configured.
  #[serde(default)]
  pub scodoc:        Option<ScoDocConfig>,
  #[serde(default)]
  pub sync:          SyncSection,
}

fn default_database_path() -> PathBuf { PathBuf::from("cursus.db") }

fn default_json_dir() -> PathBuf { PathBuf::from("data/json") }

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  /// Department acronyms left out of `GET /departments`.
  #[serde(default = "default_hidden_departments")]
  pub hidden_departments: Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl Default for ServerSettings {
  fn default() -> Self {
    Self {
      host:               default_host(),
      port:               default_port(),
      hidden_departments: default_hidden_departments(),
    }
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncSection {
  pub first_year:                 Option<i32>,
  pub last_year:                  Option<i32>,
  #[serde(default)]
  pub enrollment_key:             EnrollmentKey,
  #[serde(default)]
  pub register_unknown_decisions: bool,
  /// Overrides of the built-in work-study start table, by acronym.
  #[serde(default)]
  pub work_study_start:           BTreeMap<String, u8>,
}

impl SyncSection {
  pub fn to_settings(&self) -> SyncSettings {
    SyncSettings {
      rules:                      RuleSet::default()
        .with_work_study_start(self.work_study_start.clone()),
      enrollment_key:             self.enrollment_key,
      register_unknown_decisions: self.register_unknown_decisions,
    }
  }
}

/// Read `path` (if it exists) and overlay `CURSUS_*` variables, with `__`
/// separating nested keys (`CURSUS_SCODOC__API_TOKEN`).
pub fn load(path: &Path) -> anyhow::Result<Settings> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("CURSUS")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise configuration")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
