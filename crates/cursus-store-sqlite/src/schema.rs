//! SQL schema for the Cursus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Department ids are assigned by the external source.
CREATE TABLE IF NOT EXISTS departments (
    department_id INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    acronym       TEXT NOT NULL UNIQUE
);

-- Static: 1 = FI, 2 = FA.
CREATE TABLE IF NOT EXISTS rhythms (
    rhythm_id INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    acronym   TEXT NOT NULL UNIQUE
);

-- Static: 1 = enrolled, 2 = withdrawn.
CREATE TABLE IF NOT EXISTS enrollment_states (
    state_id INTEGER PRIMARY KEY,
    name     TEXT NOT NULL,
    acronym  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS decisions (
    decision_id INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    acronym     TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS programs (
    program_id    INTEGER PRIMARY KEY,
    program_year  INTEGER NOT NULL CHECK (program_year BETWEEN 1 AND 3),
    department_id INTEGER NOT NULL REFERENCES departments(department_id),
    rhythm_id     INTEGER NOT NULL REFERENCES rhythms(rhythm_id),
    UNIQUE (program_year, department_id, rhythm_id)
);

CREATE TABLE IF NOT EXISTS students (
    student_id INTEGER PRIMARY KEY,
    ine        TEXT NOT NULL UNIQUE   -- trimmed, lower case
);

-- Uniqueness is enforced by the session according to the configured
-- enrollment key, not by a constraint: decision_id is nullable.
CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id INTEGER PRIMARY KEY,
    academic_year INTEGER NOT NULL,
    student_id    INTEGER NOT NULL REFERENCES students(student_id),
    state_id      INTEGER NOT NULL REFERENCES enrollment_states(state_id),
    program_id    INTEGER NOT NULL REFERENCES programs(program_id),
    decision_id   INTEGER REFERENCES decisions(decision_id)
);

CREATE TABLE IF NOT EXISTS parcours (
    parcours_id   INTEGER PRIMARY KEY,
    department_id INTEGER NOT NULL REFERENCES departments(department_id),
    code          TEXT NOT NULL,
    label         TEXT NOT NULL,
    UNIQUE (department_id, code)
);

CREATE TABLE IF NOT EXISTS competencies (
    competency_id INTEGER PRIMARY KEY,
    parcours_id   INTEGER NOT NULL REFERENCES parcours(parcours_id),
    code          TEXT NOT NULL,
    label         TEXT NOT NULL,
    UNIQUE (parcours_id, code)
);

-- The only table the pipeline overwrites in place.
CREATE TABLE IF NOT EXISTS evaluations (
    enrollment_id INTEGER NOT NULL REFERENCES enrollments(enrollment_id),
    competency_id INTEGER NOT NULL REFERENCES competencies(competency_id),
    decision_id   INTEGER REFERENCES decisions(decision_id),
    average       REAL,
    PRIMARY KEY (enrollment_id, competency_id)
);

CREATE INDEX IF NOT EXISTS enrollments_student_year_idx
    ON enrollments(student_id, academic_year);
CREATE INDEX IF NOT EXISTS enrollments_year_idx ON enrollments(academic_year);

PRAGMA user_version = 1;
";
