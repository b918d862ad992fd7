//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the vacancy database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Employers, keyed by their display name
CREATE TABLE IF NOT EXISTS employers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_employers_name ON employers(name);

-- Regions, with ids derived from the name
CREATE TABLE IF NOT EXISTS areas (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Skill vocabulary
CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Vacancies, one row per site id
CREATE TABLE IF NOT EXISTS vacancies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vacancy_id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    published_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    salary_from INTEGER,
    salary_to INTEGER,
    salary_currency TEXT,
    schedule TEXT,
    employment TEXT,
    experience TEXT,
    url TEXT NOT NULL,
    employer_id TEXT REFERENCES employers(id),
    area_id INTEGER REFERENCES areas(id)
);

CREATE INDEX IF NOT EXISTS idx_vacancies_name ON vacancies(name);
CREATE INDEX IF NOT EXISTS idx_vacancies_published ON vacancies(published_at);
CREATE INDEX IF NOT EXISTS idx_vacancies_area ON vacancies(area_id);

-- Vacancy to skill links
CREATE TABLE IF NOT EXISTS vacancy_skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vacancy_db_id INTEGER NOT NULL REFERENCES vacancies(id),
    skill_id INTEGER NOT NULL REFERENCES skills(id),
    UNIQUE(vacancy_db_id, skill_id)
);

CREATE INDEX IF NOT EXISTS idx_vacancy_skills_skill ON vacancy_skills(skill_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
