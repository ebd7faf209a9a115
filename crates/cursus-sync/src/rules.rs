//! Ordered heuristic tables used to interpret external names.
//!
//! Export file names and ScoDoc program titles carry the department, the
//! program year and the rhythm only as free text. Each heuristic is a table of
//! patterns evaluated in order, first match wins. The tables are plain data so
//! that a new naming convention is a table edit, not a code change.

use std::collections::BTreeMap;

use cursus_core::{
  department::{BRIDGE_CJ_GEA, BRIDGE_SD_INFO, normalize_acronym},
  program::ProgramYear,
  reference::Rhythm,
};
use serde::{Deserialize, Serialize};

// ─── Rule types ──────────────────────────────────────────────────────────────

/// Maps a lower-cased file name to a department acronym.
///
/// The rule matches when the name contains every `all_of` pattern and at
/// least one `any_of` pattern (an empty `any_of` always matches). A matching
/// rule with no `department` stops the search: the name is deliberately left
/// unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRule {
  #[serde(default)]
  pub all_of:     Vec<String>,
  #[serde(default)]
  pub any_of:     Vec<String>,
  pub department: Option<String>,
}

impl NameRule {
  fn new(all_of: &[&str], any_of: &[&str], department: Option<&str>) -> Self {
    Self {
      all_of:     all_of.iter().map(|s| (*s).to_owned()).collect(),
      any_of:     any_of.iter().map(|s| (*s).to_owned()).collect(),
      department: department.map(str::to_owned),
    }
  }

  fn matches(&self, name: &str) -> bool {
    self.all_of.iter().all(|p| name.contains(p.as_str()))
      && (self.any_of.is_empty() || self.any_of.iter().any(|p| name.contains(p.as_str())))
  }
}

/// Substrings of an upper-cased title that indicate a program year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearMarkers {
  pub year:    ProgramYear,
  pub markers: Vec<String>,
}

impl YearMarkers {
  fn new(year: ProgramYear, markers: &[&str]) -> Self {
    Self { year, markers: markers.iter().map(|s| (*s).to_owned()).collect() }
  }
}

// ─── RuleSet ─────────────────────────────────────────────────────────────────

/// Every heuristic table the pipeline consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
  /// File name → department, in evaluation order.
  pub department_names:    Vec<NameRule>,
  /// Substrings of a lower-cased file name indicating work-study.
  pub work_study_names:    Vec<String>,
  /// Title → program year. Groups are tried in order; the first group with
  /// a marker present in the title wins.
  pub title_years:         Vec<YearMarkers>,
  /// Substrings of an upper-cased title indicating work-study.
  pub work_study_phrases:  Vec<String>,
  /// Whole alphanumeric tokens of an upper-cased title indicating
  /// work-study.
  pub work_study_tokens:   Vec<String>,
  /// First program year offering a work-study track, by department acronym.
  /// Departments absent from the table only run full-time.
  pub work_study_start:    BTreeMap<String, u8>,
}

impl Default for RuleSet {
  fn default() -> Self {
    let sd_info = Some(BRIDGE_SD_INFO.acronym);
    let cj_gea = Some(BRIDGE_CJ_GEA.acronym);
    Self {
      department_names:   vec![
        NameRule::new(&["passerelle"], &["sd", "info"], sd_info),
        NameRule::new(&["passerelle"], &["cj", "gea"], cj_gea),
        NameRule::new(&["passerelle"], &[], None),
        NameRule::new(&[], &["geii", "electrique"], Some("GEII")),
        NameRule::new(&[], &["rt", "reseaux"], Some("RT")),
        NameRule::new(&[], &["stid", "donn"], Some("STID")),
        NameRule::new(&[], &["info", "informatique"], Some("INFO")),
        NameRule::new(&[], &["cj", "juridique"], Some("CJ")),
        NameRule::new(&[], &["gea"], Some("GEA")),
      ],
      work_study_names:   ["fa", "apprentissage", "alternance", "alt"]
        .map(str::to_owned)
        .to_vec(),
      title_years:        vec![
        YearMarkers::new(ProgramYear::FIRST, &["BUT1", "BUT 1", "1A", "1ÈRE", "1ERE"]),
        YearMarkers::new(ProgramYear::SECOND, &["BUT2", "BUT 2", "2A", "2ÈME", "2EME"]),
        YearMarkers::new(ProgramYear::THIRD, &["BUT3", "BUT 3", "3A", "3ÈME", "3EME"]),
        YearMarkers::new(ProgramYear::FIRST, &["PREMIÈRE", "PREMIERE", "FIRST YEAR"]),
        YearMarkers::new(ProgramYear::SECOND, &["DEUXIÈME", "DEUXIEME", "SECOND YEAR"]),
        YearMarkers::new(ProgramYear::THIRD, &["TROISIÈME", "TROISIEME", "THIRD YEAR"]),
      ],
      work_study_phrases: ["ALTERNANCE", "APPRENTISSAGE", "WORK-STUDY"]
        .map(str::to_owned)
        .to_vec(),
      work_study_tokens:  ["FA", "APP", "ALT"].map(str::to_owned).to_vec(),
      work_study_start:   [
        ("GEA", 1),
        ("CJ", 3),
        ("GEII", 2),
        ("INFO", 2),
        ("RT", 2),
        ("SD", 2),
      ]
      .into_iter()
      .map(|(acronym, year)| (acronym.to_owned(), year))
      .collect(),
    }
  }
}

/// Result of matching a file name against [`RuleSet::department_names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch<'a> {
  Department(&'a str),
  Unresolved,
}

impl RuleSet {
  /// Override entries of the work-study start table. Acronyms are
  /// normalized.
  pub fn with_work_study_start(mut self, overrides: BTreeMap<String, u8>) -> Self {
    self
      .work_study_start
      .extend(overrides.into_iter().map(|(acronym, year)| (normalize_acronym(&acronym), year)));
    self
  }

  /// The department acronym a file name points at.
  pub fn department_for_name(&self, name: &str) -> NameMatch<'_> {
    let name = name.to_lowercase();
    self
      .department_names
      .iter()
      .find(|rule| rule.matches(&name))
      .and_then(|rule| rule.department.as_deref())
      .map_or(NameMatch::Unresolved, NameMatch::Department)
  }

  /// The rhythm a file name points at; full-time unless a work-study marker
  /// is present.
  pub fn rhythm_for_name(&self, name: &str) -> Rhythm {
    let name = name.to_lowercase();
    if self.work_study_names.iter().any(|m| name.contains(m.as_str())) {
      Rhythm::WorkStudy
    } else {
      Rhythm::FullTime
    }
  }

  /// The program year a title points at; year 1 when no marker matches.
  pub fn year_for_title(&self, title: &str) -> ProgramYear {
    let title = title.to_uppercase();
    self
      .title_years
      .iter()
      .find(|group| group.markers.iter().any(|m| title.contains(m.as_str())))
      .map_or(ProgramYear::FIRST, |group| group.year)
  }

  /// The rhythm a title points at; full-time when no marker matches.
  pub fn rhythm_for_title(&self, title: &str) -> Rhythm {
    let title = title.to_uppercase();
    let phrase = self.work_study_phrases.iter().any(|p| title.contains(p.as_str()));
    let token = title
      .split(|c: char| !c.is_alphanumeric())
      .any(|tok| self.work_study_tokens.iter().any(|t| t == tok));
    if phrase || token { Rhythm::WorkStudy } else { Rhythm::FullTime }
  }

  /// First year of the department's work-study track, if it has one.
  pub fn work_study_start(&self, acronym: &str) -> Option<ProgramYear> {
    self
      .work_study_start
      .get(&normalize_acronym(acronym))
      .copied()
      .and_then(ProgramYear::new)
  }
}

/// The first run of four ASCII digits in `name`, read as a year.
pub fn year_in_name(name: &str) -> Option<i32> {
  let bytes = name.as_bytes();
  let start = bytes.windows(4).position(|w| w.iter().all(u8::is_ascii_digit))?;
  name.get(start..start + 4)?.parse().ok()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn department_names_follow_rule_order() {
    let rules = RuleSet::default();
    let cases = [
      ("decisions_geii_2022_fa.json", NameMatch::Department("GEII")),
      ("decisions_passerelle_sd_2023.json", NameMatch::Department("P_SD_INFO")),
      ("decisions_passerelle_gea_2023.json", NameMatch::Department("P_CJ_GEA")),
      ("decisions_passerelle_2023.json", NameMatch::Unresolved),
      ("decisions_reseaux_2021.json", NameMatch::Department("RT")),
      ("decisions_science_donnees_2021.json", NameMatch::Department("STID")),
      ("decisions_INFO_2021.json", NameMatch::Department("INFO")),
      ("decisions_juridique_2022.json", NameMatch::Department("CJ")),
      ("decisions_gea_2022.json", NameMatch::Department("GEA")),
      ("decisions_mmi_2022.json", NameMatch::Unresolved),
    ];
    for (name, expected) in cases {
      assert_eq!(rules.department_for_name(name), expected, "{name}");
    }
  }

  #[test]
  fn rhythm_from_name() {
    let rules = RuleSet::default();
    assert_eq!(rules.rhythm_for_name("decisions_geii_2022_fa.json"), Rhythm::WorkStudy);
    assert_eq!(rules.rhythm_for_name("decisions_rt_Alternance_2022.json"), Rhythm::WorkStudy);
    assert_eq!(rules.rhythm_for_name("decisions_geii_2022.json"), Rhythm::FullTime);
  }

  #[test]
  fn year_token_in_name() {
    assert_eq!(year_in_name("decisions_geii_2022_fa.json"), Some(2022));
    assert_eq!(year_in_name("decisions_12345.json"), Some(1234));
    assert_eq!(year_in_name("decisions_geii.json"), None);
  }

  #[test]
  fn title_year_markers() {
    let rules = RuleSet::default();
    assert_eq!(rules.year_for_title("BUT2 GEA"), ProgramYear::SECOND);
    assert_eq!(rules.year_for_title("but 3 informatique"), ProgramYear::THIRD);
    assert_eq!(rules.year_for_title("Troisième année RT"), ProgramYear::THIRD);
    assert_eq!(rules.year_for_title("BUT Réseaux"), ProgramYear::FIRST);
  }

  #[test]
  fn title_rhythm_markers() {
    let rules = RuleSet::default();
    assert_eq!(rules.rhythm_for_title("BUT GEII en alternance"), Rhythm::WorkStudy);
    assert_eq!(rules.rhythm_for_title("BUT-INFO-FA"), Rhythm::WorkStudy);
    assert_eq!(rules.rhythm_for_title("BUT INFO"), Rhythm::FullTime);
    // "FA" inside a word is not a marker.
    assert_eq!(rules.rhythm_for_title("BUT FACILITIES"), Rhythm::FullTime);
  }

  #[test]
  fn built_in_work_study_table() {
    let rules = RuleSet::default();
    let table: Vec<_> = ["GEA", "CJ", "GEII", "INFO", "RT", "SD", "STID"]
      .into_iter()
      .map(|acronym| rules.work_study_start(acronym).map(ProgramYear::get))
      .collect();
    assert_eq!(table, [Some(1), Some(3), Some(2), Some(2), Some(2), Some(2), None]);
  }

  #[test]
  fn work_study_start_overrides() {
    let rules = RuleSet::default()
      .with_work_study_start(BTreeMap::from([("mmi".to_owned(), 3), ("GEA".to_owned(), 2)]));
    assert_eq!(rules.work_study_start("MMI"), Some(ProgramYear::THIRD));
    assert_eq!(rules.work_study_start("gea"), Some(ProgramYear::SECOND));
    assert_eq!(rules.work_study_start("CJ"), Some(ProgramYear::THIRD));
    assert_eq!(rules.work_study_start("QLIO"), None);
  }
}
