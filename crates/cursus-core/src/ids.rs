//! Local surrogate keys.
//!
//! Every stored entity is keyed by an SQLite integer rowid. The newtypes keep
//! a department id from being passed where a program id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! surrogate_id {
  ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
    $(
      $(#[$meta])*
      #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
      )]
      #[serde(transparent)]
      pub struct $name(pub i64);

      impl fmt::Display for $name {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
          write!(f, "{}", self.0)
        }
      }
    )*
  };
}

surrogate_id! {
  /// Departments keep the identifier assigned by the external source.
  DepartmentId,
  DecisionId,
  ProgramId,
  StudentId,
  EnrollmentId,
  ParcoursId,
  CompetencyId,
}
