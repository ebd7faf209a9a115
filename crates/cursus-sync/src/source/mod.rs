//! Source adapters.
//!
//! An adapter performs every external read up front and hands the
//! orchestrator a [`SyncBatch`]. Applying a batch touches only the store, so
//! the write transaction never spans network or file I/O.

pub mod files;
pub mod scodoc;

use std::{fmt, future::Future};

use cursus_core::{department::NewDepartment, reference::Rhythm};
use cursus_scodoc::types::{ApiFramework, JuryRecord};

pub use files::FilesSource;
pub use scodoc::ScoDocSource;

use crate::error::Result;

/// Which adapter produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  Files,
  ScoDoc,
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Files => "files",
      Self::ScoDoc => "scodoc",
    })
  }
}

/// Everything one run will apply.
#[derive(Debug, Clone)]
pub struct SyncBatch {
  pub kind:        SourceKind,
  pub departments: Vec<NewDepartment>,
  pub programs:    ProgramPlan,
  pub frameworks:  Vec<FrameworkRecord>,
  pub units:       Vec<SourceUnit>,
  /// Non-fatal failures met while gathering.
  pub errors:      Vec<String>,
}

/// How the set of programs is derived.
#[derive(Debug, Clone)]
pub enum ProgramPlan {
  /// From the per-department work-study start table.
  Rules,
  /// From the titles of externally listed programs.
  Titles(Vec<ProgramRecord>),
}

/// An externally listed program, before its title is interpreted.
#[derive(Debug, Clone)]
pub struct ProgramRecord {
  pub external_id: i64,
  /// External department id, which is also the local one.
  pub department:  i64,
  pub title:       String,
  /// Rhythm stated explicitly by the source; wins over the title.
  pub rhythm_hint: Option<Rhythm>,
}

/// The competency framework attached to an external program.
#[derive(Debug, Clone)]
pub struct FrameworkRecord {
  pub program:   i64,
  pub framework: ApiFramework,
}

/// Where the program of a unit's records comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramHint {
  /// Department and rhythm known for the whole unit; the program year is
  /// read from each record.
  Derived { department: String, rhythm: Rhythm },
  /// An external program id, resolved through the synthesized catalog.
  External(i64),
}

/// A group of student records sharing a program hint: one export file, or
/// one ScoDoc term.
#[derive(Debug, Clone)]
pub struct SourceUnit {
  pub label:         String,
  /// Default academic year; a record's own `annee.annee_scolaire` wins.
  pub academic_year: Option<i32>,
  pub program:       ProgramHint,
  pub records:       Vec<JuryRecord>,
}

/// Produces a [`SyncBatch`] from an external source.
pub trait SourceAdapter: Send + Sync {
  fn kind(&self) -> SourceKind;

  /// Read everything the run needs. Only failures that must abort the run
  /// are returned as errors; the rest end up in [`SyncBatch::errors`].
  fn gather(&self) -> impl Future<Output = Result<SyncBatch>> + Send + '_;
}
