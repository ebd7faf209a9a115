//! Programs (formations): one row per (program-year, department, rhythm).

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  ids::{DepartmentId, ProgramId},
  reference::Rhythm,
};

/// Progress within the three-year BUT; always in `1..=3`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct ProgramYear(u8);

impl ProgramYear {
  pub const FIRST: Self = Self(1);
  pub const SECOND: Self = Self(2);
  pub const THIRD: Self = Self(3);
  pub const ALL: [Self; 3] = [Self::FIRST, Self::SECOND, Self::THIRD];

  pub fn new(year: u8) -> Option<Self> { (1..=3).contains(&year).then_some(Self(year)) }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for ProgramYear {
  type Error = Error;

  fn try_from(year: u8) -> Result<Self, Error> {
    Self::new(year).ok_or(Error::InvalidProgramYear(i64::from(year)))
  }
}

impl TryFrom<i64> for ProgramYear {
  type Error = Error;

  fn try_from(year: i64) -> Result<Self, Error> {
    u8::try_from(year)
      .ok()
      .and_then(Self::new)
      .ok_or(Error::InvalidProgramYear(year))
  }
}

impl From<ProgramYear> for u8 {
  fn from(year: ProgramYear) -> u8 { year.0 }
}

/// The natural unique key of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramKey {
  pub year:       ProgramYear,
  pub department: DepartmentId,
  pub rhythm:     Rhythm,
}

impl ProgramKey {
  pub fn new(year: ProgramYear, department: DepartmentId, rhythm: Rhythm) -> Self {
    Self { year, department, rhythm }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
  pub id:  ProgramId,
  pub key: ProgramKey,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn program_year_bounds() {
    assert!(ProgramYear::new(0).is_none());
    assert_eq!(ProgramYear::new(2), Some(ProgramYear::SECOND));
    assert!(ProgramYear::new(4).is_none());
    assert!(ProgramYear::try_from(-1_i64).is_err());
    assert_eq!(ProgramYear::try_from(3_i64).unwrap(), ProgramYear::THIRD);
  }

  #[test]
  fn program_year_serde() {
    let year: ProgramYear = serde_json::from_str("2").unwrap();
    assert_eq!(year, ProgramYear::SECOND);
    assert!(serde_json::from_str::<ProgramYear>("7").is_err());
  }
}
