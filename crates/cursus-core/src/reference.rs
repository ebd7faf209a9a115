//! Static reference vocabulary: rhythms, enrollment states and the known
//! jury-decision codes.
//!
//! Rhythms and states are closed enumerations with fixed ids; they are seeded
//! once and never change. Decisions are an open vocabulary seeded from
//! [`DECISION_SEED`].

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::{Error, Result, ids::DecisionId};

// ─── Rhythm ──────────────────────────────────────────────────────────────────

/// Full-time versus work-study track.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rhythm {
  /// Formation initiale.
  FullTime,
  /// Apprenticeship / alternance.
  WorkStudy,
}

impl Rhythm {
  pub fn id(self) -> i64 {
    match self {
      Self::FullTime => 1,
      Self::WorkStudy => 2,
    }
  }

  pub fn from_id(id: i64) -> Result<Self> {
    match id {
      1 => Ok(Self::FullTime),
      2 => Ok(Self::WorkStudy),
      other => Err(Error::UnknownRhythm(other)),
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::FullTime => "Formation Initiale",
      Self::WorkStudy => "Formation Apprentissage",
    }
  }

  pub fn acronym(self) -> &'static str {
    match self {
      Self::FullTime => "FI",
      Self::WorkStudy => "FA",
    }
  }

  /// Parse a rhythm acronym as exchanged with the outside world. Accepts the
  /// apprenticeship spelling `APP` used by some exports.
  pub fn from_acronym(s: &str) -> Option<Self> {
    match s.trim().to_ascii_uppercase().as_str() {
      "FI" => Some(Self::FullTime),
      "FA" | "APP" => Some(Self::WorkStudy),
      _ => None,
    }
  }
}

// ─── EnrollmentState ─────────────────────────────────────────────────────────

/// Administrative state of an enrollment.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
  Enrolled,
  Withdrawn,
}

impl EnrollmentState {
  pub fn id(self) -> i64 {
    match self {
      Self::Enrolled => 1,
      Self::Withdrawn => 2,
    }
  }

  pub fn from_id(id: i64) -> Result<Self> {
    match id {
      1 => Ok(Self::Enrolled),
      2 => Ok(Self::Withdrawn),
      other => Err(Error::UnknownEnrollmentState(other)),
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Enrolled => "Inscrit",
      Self::Withdrawn => "Démission",
    }
  }

  pub fn acronym(self) -> &'static str {
    match self {
      Self::Enrolled => "I",
      Self::Withdrawn => "D",
    }
  }
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// A jury-decision code as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub id:      DecisionId,
  pub name:    String,
  /// Unique across all decisions; always upper case.
  pub acronym: String,
}

/// `(name, acronym)` pairs seeded by the reference-data loader.
pub const DECISION_SEED: &[(&str, &str)] = &[
  ("Admis", "ADM"),
  ("Ajourné", "AJ"),
  ("Admis par Compensation", "CMP"),
  ("Admis Supérieur", "ADSUP"),
  ("Ajourné (Rattrapage)", "ADJR"),
  ("Ajourné (Jury)", "ADJ"),
  ("Défaillant", "DEF"),
  ("Non Admis Redouble", "NAR"),
  ("Redoublement", "RED"),
  ("Passage de Droit", "PASD"),
  ("Passage Conditionnel", "PAS1NCI"),
  ("En attente", "ATT"),
  ("En attente (Bloqué)", "ATB"),
  ("Validé", "V"),
  ("Validé (Variante)", "VAL"),
  ("Non Validé", "NV"),
  ("Validé par Compensation Annuelle", "VCA"),
  ("Validé par Commission", "VCC"),
  ("Admis Sous Réserve", "ADM-INC"),
  ("Démissionnaire", "DEM"),
  ("Absence Injustifiée", "ABI"),
  ("Absence Justifiée", "ABJ"),
  ("Excusé", "EXC"),
  ("Non Inscrit", "NI"),
  ("Année Blanche", "ABL"),
  ("Inscrit (En cours)", "INS"),
  ("Abandon", "ABAN"),
  ("Attente Jury", "ATJ"),
];

/// Decision codes that put the enrollment in the withdrawn state.
pub const WITHDRAWN_CODES: &[&str] = &["DEM", "DEF", "ABAN", "NI", "D"];

/// Normalise a raw decision code for lookup: trimmed, upper case.
pub fn normalize_code(raw: &str) -> String { raw.trim().to_uppercase() }

impl EnrollmentState {
  /// The state implied by a resolved decision code.
  pub fn for_decision(code: &str) -> Self {
    let code = normalize_code(code);
    if WITHDRAWN_CODES.contains(&code.as_str()) {
      Self::Withdrawn
    } else {
      Self::Enrolled
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn rhythm_ids_roundtrip() {
    for rhythm in Rhythm::iter() {
      assert_eq!(Rhythm::from_id(rhythm.id()).unwrap(), rhythm);
    }
    assert!(Rhythm::from_id(3).is_err());
  }

  #[test]
  fn rhythm_acronyms() {
    assert_eq!(Rhythm::from_acronym("fa"), Some(Rhythm::WorkStudy));
    assert_eq!(Rhythm::from_acronym(" APP "), Some(Rhythm::WorkStudy));
    assert_eq!(Rhythm::from_acronym("FI"), Some(Rhythm::FullTime));
    assert_eq!(Rhythm::from_acronym("FC"), None);
  }

  #[test]
  fn seed_acronyms_are_unique_and_upper_case() {
    let mut seen = std::collections::HashSet::new();
    for (_, acronym) in DECISION_SEED {
      assert_eq!(*acronym, normalize_code(acronym));
      assert!(seen.insert(*acronym), "duplicate acronym {acronym}");
    }
  }

  #[test]
  fn withdrawn_state_from_code() {
    assert_eq!(EnrollmentState::for_decision("dem"), EnrollmentState::Withdrawn);
    assert_eq!(EnrollmentState::for_decision("ABAN"), EnrollmentState::Withdrawn);
    assert_eq!(EnrollmentState::for_decision("ADM"), EnrollmentState::Enrolled);
    assert_eq!(EnrollmentState::for_decision("INS"), EnrollmentState::Enrolled);
  }
}
