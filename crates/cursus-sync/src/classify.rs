//! Decision/outcome classification of a raw jury record.

use cursus_core::reference::{EnrollmentState, normalize_code};
use cursus_scodoc::types::JuryRecord;

/// A decision code and the enrollment state it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
  /// Normalized (trimmed, upper case) decision acronym.
  pub code:  String,
  pub state: EnrollmentState,
}

/// Decision code implied by the coarse administrative flag when the record
/// carries no explicit decision.
fn code_for_state_flag(flag: &str) -> Option<&'static str> {
  match flag.trim().to_uppercase().as_str() {
    "D" => Some("DEM"),
    "DEF" => Some("DEF"),
    "ABAN" => Some("DEM"),
    "I" => Some("INS"),
    _ => None,
  }
}

/// Derive a decision code from `record`.
///
/// The annual decision wins, then the generic decision, then the semester
/// decision, then the state flag. Returns `None` when nothing yields a code;
/// callers skip such records.
pub fn classify(record: &JuryRecord) -> Option<Classification> {
  let code = record
    .annual_code()
    .or_else(|| record.generic_code())
    .or_else(|| record.semester_code())
    .or_else(|| {
      record
        .state_flag()
        .as_deref()
        .and_then(code_for_state_flag)
        .map(str::to_owned)
    })?;

  let code = normalize_code(&code);
  if code.is_empty() {
    return None;
  }
  let state = EnrollmentState::for_decision(&code);
  Some(Classification { code, state })
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn record(value: serde_json::Value) -> JuryRecord { serde_json::from_value(value).unwrap() }

  #[test]
  fn withdrawn_flag_without_decision() {
    let c = classify(&record(json!({"etudid": "1", "etat": "D"}))).unwrap();
    assert_eq!(c.code, "DEM");
    assert_eq!(c.state, EnrollmentState::Withdrawn);
  }

  #[test]
  fn fallback_order() {
    let all = record(json!({
      "annee": {"code": "pasd"},
      "decision": {"code": "ADM"},
      "semestre": {"code": "AJ"},
      "etat": "D",
    }));
    assert_eq!(classify(&all).unwrap().code, "PASD");

    let no_annual = record(json!({
      "annee": {"ordre": 1},
      "decision": {"code": "ADM"},
      "semestre": {"code": "AJ"},
    }));
    assert_eq!(classify(&no_annual).unwrap().code, "ADM");

    let semester_only = record(json!({"semestre": {"code": "AJ"}, "etat": "I"}));
    assert_eq!(classify(&semester_only).unwrap().code, "AJ");

    let enrolled = record(json!({"etat": "I"}));
    let c = classify(&enrolled).unwrap();
    assert_eq!(c.code, "INS");
    assert_eq!(c.state, EnrollmentState::Enrolled);
  }

  #[test]
  fn state_flag_mapping() {
    let defaulted = classify(&record(json!({"etat": "DEF"}))).unwrap();
    assert_eq!(defaulted.state, EnrollmentState::Withdrawn);
    assert_eq!(classify(&record(json!({"etat": "ABAN"}))).unwrap().code, "DEM");
  }

  #[test]
  fn explicit_withdrawal_codes() {
    for code in ["DEM", "DEF", "ABAN", "NI", "D"] {
      let c = classify(&record(json!({"decision": {"code": code}}))).unwrap();
      assert_eq!(c.state, EnrollmentState::Withdrawn, "{code}");
    }
    let c = classify(&record(json!({"decision": {"code": "RED"}}))).unwrap();
    assert_eq!(c.state, EnrollmentState::Enrolled);
  }

  #[test]
  fn nothing_to_classify() {
    assert_eq!(classify(&record(json!({"etudid": "1"}))), None);
    assert_eq!(classify(&record(json!({"etudid": "1", "etat": "X"}))), None);
    assert_eq!(classify(&record(json!({"decision": {"code": "  "}}))), None);
  }
}
