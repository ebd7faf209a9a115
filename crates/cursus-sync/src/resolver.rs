//! Per-run entity resolution.
//!
//! A [`Resolver`] maps external keys (department acronyms, INEs, program
//! triples, decision acronyms) to local surrogate ids. It is created at the
//! start of an apply phase from what the store already holds, grows as rows
//! are ensured, and is dropped with the run.
//!
//! `resolve`-style methods only consult the cache; `ensure_*` methods write
//! through the session when the key is unknown.

use std::collections::{BTreeMap, HashMap};

use cursus_core::{
  department::{NewDepartment, normalize_acronym},
  enrollment::normalize_ine,
  ids::{DecisionId, DepartmentId, ProgramId, StudentId},
  program::ProgramKey,
  reference::normalize_code,
  session::{Ensured, SessionError, SyncSession},
};

pub struct Resolver {
  /// Acronym → id, ordered by acronym.
  departments:       BTreeMap<String, DepartmentId>,
  department_lookup: HashMap<DepartmentId, String>,
  programs:          HashMap<ProgramKey, ProgramId>,
  students:          HashMap<String, StudentId>,
  decisions:         HashMap<String, DecisionId>,
}

impl Resolver {
  /// Prime the caches with the departments, programs and decisions already
  /// stored. Students are resolved lazily.
  pub fn load<E: SessionError>(session: &mut dyn SyncSession<Error = E>) -> Result<Self, E> {
    let mut resolver = Self {
      departments:       BTreeMap::new(),
      department_lookup: HashMap::new(),
      programs:          HashMap::new(),
      students:          HashMap::new(),
      decisions:         session.decision_ids()?,
    };
    for department in session.departments()? {
      resolver.remember_department(department.id, department.acronym);
    }
    resolver.programs = session
      .programs()?
      .into_iter()
      .map(|p| (p.key, p.id))
      .collect();
    Ok(resolver)
  }

  fn remember_department(&mut self, id: DepartmentId, acronym: String) {
    self.department_lookup.insert(id, acronym.clone());
    self.departments.insert(acronym, id);
  }

  // ── Departments ───────────────────────────────────────────────────────

  pub fn department(&self, acronym: &str) -> Option<DepartmentId> {
    self.departments.get(&normalize_acronym(acronym)).copied()
  }

  pub fn department_acronym(&self, id: DepartmentId) -> Option<&str> {
    self.department_lookup.get(&id).map(String::as_str)
  }

  /// Every known department as `(acronym, id)`, ordered by acronym.
  pub fn departments(&self) -> impl Iterator<Item = (&str, DepartmentId)> + '_ {
    self.departments.iter().map(|(acronym, id)| (acronym.as_str(), *id))
  }

  /// `None` when the department's id is already taken by another acronym.
  pub fn ensure_department<E: SessionError>(
    &mut self,
    session: &mut dyn SyncSession<Error = E>,
    department: &NewDepartment,
  ) -> Result<Option<Ensured<DepartmentId>>, E> {
    if let Some(id) = self.department(&department.acronym) {
      return Ok(Some(Ensured::existing(id)));
    }
    let ensured = session.ensure_department(department)?;
    if let Some(ensured) = ensured {
      self.remember_department(ensured.id, department.acronym.clone());
    }
    Ok(ensured)
  }

  // ── Programs ──────────────────────────────────────────────────────────

  pub fn program(&self, key: ProgramKey) -> Option<ProgramId> { self.programs.get(&key).copied() }

  pub fn ensure_program<E: SessionError>(
    &mut self,
    session: &mut dyn SyncSession<Error = E>,
    key: ProgramKey,
  ) -> Result<Ensured<ProgramId>, E> {
    if let Some(id) = self.program(key) {
      return Ok(Ensured::existing(id));
    }
    let ensured = session.ensure_program(key)?;
    self.programs.insert(key, ensured.id);
    Ok(ensured)
  }

  // ── Students ──────────────────────────────────────────────────────────

  /// Ensure the student identified by `raw_ine`. Returns `None` for an
  /// empty identifier.
  pub fn ensure_student<E: SessionError>(
    &mut self,
    session: &mut dyn SyncSession<Error = E>,
    raw_ine: &str,
  ) -> Result<Option<Ensured<StudentId>>, E> {
    let Some(ine) = normalize_ine(raw_ine) else {
      return Ok(None);
    };
    if let Some(id) = self.students.get(&ine) {
      return Ok(Some(Ensured::existing(*id)));
    }
    let ensured = session.ensure_student(&ine)?;
    self.students.insert(ine, ensured.id);
    Ok(Some(ensured))
  }

  /// Distinct students resolved during this run.
  pub fn students_seen(&self) -> u64 { self.students.len() as u64 }

  // ── Decisions ─────────────────────────────────────────────────────────

  pub fn decision(&self, code: &str) -> Option<DecisionId> {
    self.decisions.get(&normalize_code(code)).copied()
  }

  /// Resolve `code`, registering it as a new decision (named after its
  /// acronym) when `register` is set and it is unknown.
  pub fn ensure_decision<E: SessionError>(
    &mut self,
    session: &mut dyn SyncSession<Error = E>,
    code: &str,
    register: bool,
  ) -> Result<Option<Ensured<DecisionId>>, E> {
    let code = normalize_code(code);
    if code.is_empty() {
      return Ok(None);
    }
    if let Some(id) = self.decisions.get(&code) {
      return Ok(Some(Ensured::existing(*id)));
    }
    if !register {
      return Ok(None);
    }
    let ensured = session.ensure_decision(&code, &code)?;
    self.decisions.insert(code, ensured.id);
    Ok(Some(ensured))
  }
}
