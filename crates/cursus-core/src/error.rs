//! Error types for `cursus-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown rhythm id: {0}")]
  UnknownRhythm(i64),

  #[error("unknown enrollment state id: {0}")]
  UnknownEnrollmentState(i64),

  #[error("program year out of range (expected 1..=3): {0}")]
  InvalidProgramYear(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
