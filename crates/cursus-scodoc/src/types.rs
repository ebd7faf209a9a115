//! Wire types returned by ScoDoc and found in its JSON exports.
//!
//! ScoDoc payloads are loosely shaped: identifiers arrive as strings or
//! numbers, listings come bare or wrapped in an object, and nested decision
//! blocks are sometimes absent or not objects at all. Fields that vary are
//! kept as [`serde_json::Value`] and read through lenient accessors.

use std::collections::BTreeMap;

use cursus_core::reference::Rhythm;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

// ─── Listings ────────────────────────────────────────────────────────────────

/// Extract the item list from a payload that is either a bare array or an
/// object holding the array under `key`. Anything else yields no items.
pub fn unwrap_listing(value: Value, key: &str) -> Vec<Value> {
  match value {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove(key) {
      Some(Value::Array(items)) => items,
      _ => Vec::new(),
    },
    _ => Vec::new(),
  }
}

/// Deserialize every item, dropping (and logging) the ones that don't fit.
pub fn parse_items<T: DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
  items
    .into_iter()
    .filter_map(|item| match serde_json::from_value(item) {
      Ok(parsed) => Some(parsed),
      Err(e) => {
        tracing::warn!(error = %e, "skipping malformed {what}");
        None
      }
    })
    .collect()
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

/// A string or number rendered as a non-empty string.
pub fn value_as_string(value: &Value) -> Option<String> {
  let s = match value {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    _ => return None,
  };
  (!s.is_empty()).then_some(s)
}

/// A number, or a string holding one (`"12.5"`, `"12,5"`).
pub fn value_as_f64(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().replace(',', ".").parse().ok(),
    _ => None,
  }
}

/// A year given as `2022`, `"2022"` or `"2022-2023"`.
pub fn value_as_year(value: &Value) -> Option<i32> {
  match value {
    Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
    Value::String(s) => s.trim().split(['-', '/']).next()?.trim().parse().ok(),
    _ => None,
  }
}

fn value_as_i64(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// The `code` member of a nested decision block, if that block is an object.
fn nested_code(block: Option<&Value>) -> Option<String> {
  block?.as_object()?.get("code").and_then(value_as_string)
}

// ─── Departments and programs ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDepartment {
  pub id:      i64,
  #[serde(alias = "acronyme")]
  pub acronym: String,
  #[serde(default, rename = "dept_name", alias = "nom", alias = "name")]
  pub name:    Option<String>,
}

impl ApiDepartment {
  pub fn display_name(&self) -> &str { self.name.as_deref().unwrap_or(&self.acronym) }
}

/// A ScoDoc `formation`. Listings carry both `id` and `formation_id`; either
/// one is enough.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawProgram")]
pub struct ApiProgram {
  pub id:             i64,
  pub acronyme:       Option<String>,
  pub titre:          Option<String>,
  pub titre_officiel: Option<String>,
  pub dept_id:        Option<i64>,
  /// Either an acronym, a rhythm id, or an object `{id, nom, acronyme}`.
  pub rythme:         Option<Value>,
  pub rythme_id:      Option<i64>,
}

#[derive(Deserialize)]
struct RawProgram {
  #[serde(default)]
  id:             Option<i64>,
  #[serde(default)]
  formation_id:   Option<i64>,
  #[serde(default)]
  acronyme:       Option<String>,
  #[serde(default)]
  titre:          Option<String>,
  #[serde(default)]
  title:          Option<String>,
  #[serde(default)]
  titre_officiel: Option<String>,
  #[serde(default)]
  dept_id:        Option<i64>,
  #[serde(default)]
  departement_id: Option<i64>,
  #[serde(default)]
  rythme:         Option<Value>,
  #[serde(default)]
  rythme_id:      Option<i64>,
}

impl TryFrom<RawProgram> for ApiProgram {
  type Error = String;

  fn try_from(raw: RawProgram) -> Result<Self, Self::Error> {
    let id = raw.id.or(raw.formation_id).ok_or("program without `id` or `formation_id`")?;
    Ok(Self {
      id,
      acronyme: raw.acronyme,
      titre: raw.titre.or(raw.title),
      titre_officiel: raw.titre_officiel,
      dept_id: raw.dept_id.or(raw.departement_id),
      rythme: raw.rythme,
      rythme_id: raw.rythme_id,
    })
  }
}

impl ApiProgram {
  /// Every free-text label of the program, space separated.
  pub fn title(&self) -> String {
    [&self.acronyme, &self.titre, &self.titre_officiel]
      .into_iter()
      .flatten()
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// The rhythm ScoDoc states explicitly, if any.
  pub fn rhythm_hint(&self) -> Option<Rhythm> {
    let from_value = match &self.rythme {
      Some(Value::String(s)) => Rhythm::from_acronym(s),
      Some(Value::Number(n)) => n.as_i64().and_then(|id| Rhythm::from_id(id).ok()),
      Some(Value::Object(o)) => o
        .get("acronyme")
        .and_then(Value::as_str)
        .and_then(Rhythm::from_acronym)
        .or_else(|| {
          o.get("id")
            .and_then(value_as_i64)
            .and_then(|id| Rhythm::from_id(id).ok())
        }),
      _ => None,
    };
    from_value.or_else(|| self.rythme_id.and_then(|id| Rhythm::from_id(id).ok()))
  }
}

// ─── Competency framework ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiFramework {
  #[serde(default)]
  pub parcours:    Vec<ApiParcours>,
  #[serde(default)]
  pub competences: Vec<ApiCompetence>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiParcours {
  pub id:      i64,
  pub code:    String,
  #[serde(default, alias = "label")]
  pub libelle: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCompetence {
  pub id:          i64,
  #[serde(alias = "number")]
  pub numero:      i64,
  #[serde(default, alias = "libelle", alias = "label")]
  pub titre:       Option<String>,
  #[serde(default)]
  pub parcours_id: Option<i64>,
}

// ─── Terms ───────────────────────────────────────────────────────────────────

/// A ScoDoc `formsemestre`: one program running for one semester. The id is
/// read from `id`, falling back to `formsemestre_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawTerm")]
pub struct ApiTerm {
  pub id:             i64,
  pub formation_id:   i64,
  pub annee_scolaire: Option<Value>,
  pub semestre_id:    Option<i64>,
}

#[derive(Deserialize)]
struct RawTerm {
  #[serde(default)]
  id:              Option<i64>,
  #[serde(default)]
  formsemestre_id: Option<i64>,
  formation_id:    i64,
  #[serde(default)]
  annee_scolaire:  Option<Value>,
  #[serde(default)]
  semestre_id:     Option<i64>,
}

impl TryFrom<RawTerm> for ApiTerm {
  type Error = String;

  fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
    let id = raw.id.or(raw.formsemestre_id).ok_or("term without `id` or `formsemestre_id`")?;
    Ok(Self {
      id,
      formation_id: raw.formation_id,
      annee_scolaire: raw.annee_scolaire,
      semestre_id: raw.semestre_id,
    })
  }
}

impl ApiTerm {
  pub fn academic_year(&self) -> Option<i32> {
    self.annee_scolaire.as_ref().and_then(value_as_year)
  }
}

// ─── Jury decisions ──────────────────────────────────────────────────────────

/// One student's entry in a jury-decision listing or export file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JuryRecord {
  #[serde(default)]
  pub etudid:                 Option<Value>,
  #[serde(default)]
  pub code_ine:               Option<Value>,
  /// Coarse administrative flag: `I`, `D`, `DEF`, `ABAN`.
  #[serde(default)]
  pub etat:                   Option<Value>,
  #[serde(default)]
  pub decision:               Option<Value>,
  #[serde(default)]
  pub annee:                  Option<Value>,
  #[serde(default)]
  pub semestre:               Option<Value>,
  #[serde(default)]
  pub validation_competences: Option<Value>,
}

/// A per-competency outcome attached to a jury record.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetencyOutcome {
  pub competency_id: i64,
  pub code:          Option<String>,
  pub average:       Option<f64>,
}

impl JuryRecord {
  /// The student identifier: `code_ine` when present, else `etudid`.
  pub fn student_id(&self) -> Option<String> {
    self
      .code_ine
      .as_ref()
      .and_then(value_as_string)
      .or_else(|| self.etudid.as_ref().and_then(value_as_string))
  }

  pub fn annual_code(&self) -> Option<String> { nested_code(self.annee.as_ref()) }

  pub fn generic_code(&self) -> Option<String> { nested_code(self.decision.as_ref()) }

  pub fn semester_code(&self) -> Option<String> { nested_code(self.semestre.as_ref()) }

  pub fn state_flag(&self) -> Option<String> { self.etat.as_ref().and_then(value_as_string) }

  /// `annee.annee_scolaire`, when it parses as a year.
  pub fn academic_year(&self) -> Option<i32> {
    self.annee.as_ref()?.as_object()?.get("annee_scolaire").and_then(value_as_year)
  }

  /// `annee.ordre`, the program level marker (`"1"`, `"BUT2"`, …).
  pub fn level_marker(&self) -> Option<String> {
    self.annee.as_ref()?.as_object()?.get("ordre").and_then(value_as_string)
  }

  /// Entries of `validation_competences`, keyed by external competency id.
  /// Entries with a non-numeric key are dropped.
  pub fn competency_outcomes(&self) -> Vec<CompetencyOutcome> {
    let Some(Value::Object(map)) = &self.validation_competences else {
      return Vec::new();
    };

    let sorted: BTreeMap<i64, &Value> = map
      .iter()
      .filter_map(|(key, value)| Some((key.trim().parse().ok()?, value)))
      .collect();

    sorted
      .into_iter()
      .map(|(competency_id, value)| {
        let block = value.as_object();
        let field = |names: &[&str]| {
          block.and_then(|b| names.iter().find_map(|name| b.get(*name)))
        };
        CompetencyOutcome {
          competency_id,
          code: field(&["code"]).and_then(value_as_string),
          average: field(&["moy", "moyenne", "average"]).and_then(value_as_f64),
        }
      })
      .collect()
  }
}
