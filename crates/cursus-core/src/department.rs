//! Departments and the two synthetic bridge (passerelle) departments.

use serde::{Deserialize, Serialize};

use crate::ids::DepartmentId;

/// A teaching department. The acronym is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub id:      DepartmentId,
  pub name:    String,
  pub acronym: String,
}

/// Input to [`crate::session::SyncSession::ensure_department`]. The id is the
/// one assigned by the external source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
  pub id:      DepartmentId,
  pub name:    String,
  pub acronym: String,
}

impl NewDepartment {
  pub fn new(id: i64, name: impl Into<String>, acronym: &str) -> Self {
    Self { id: DepartmentId(id), name: name.into(), acronym: normalize_acronym(acronym) }
  }
}

/// Acronyms are compared trimmed and upper case.
pub fn normalize_acronym(raw: &str) -> String { raw.trim().to_uppercase() }

/// Departments left out of the department filter offered to readers:
/// continuing education and the CJ→GEA bridge.
pub const HIDDEN_BY_DEFAULT: [&str; 2] = ["FC", "P_CJ_GEA"];

pub fn default_hidden_departments() -> Vec<String> {
  HIDDEN_BY_DEFAULT.iter().map(|s| (*s).to_owned()).collect()
}

// ─── Bridge departments ──────────────────────────────────────────────────────

/// A transition track into the second program year. Never sourced
/// externally; the synthesizer injects these with fixed ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeDepartment {
  pub id:      DepartmentId,
  pub name:    &'static str,
  pub acronym: &'static str,
}

pub const BRIDGE_SD_INFO: BridgeDepartment = BridgeDepartment {
  id:      DepartmentId(9),
  name:    "Passerelle SD INFO",
  acronym: "P_SD_INFO",
};

pub const BRIDGE_CJ_GEA: BridgeDepartment = BridgeDepartment {
  id:      DepartmentId(10),
  name:    "Passerelle CJ GEA",
  acronym: "P_CJ_GEA",
};

pub const BRIDGE_DEPARTMENTS: [BridgeDepartment; 2] = [BRIDGE_SD_INFO, BRIDGE_CJ_GEA];

impl BridgeDepartment {
  pub fn to_new(self) -> NewDepartment {
    NewDepartment::new(self.id.0, self.name, self.acronym)
  }
}

/// Whether `acronym` names one of the bridge departments.
pub fn is_bridge(acronym: &str) -> bool {
  let acronym = normalize_acronym(acronym);
  BRIDGE_DEPARTMENTS.iter().any(|b| b.acronym == acronym)
}
