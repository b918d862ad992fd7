//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::DetailRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::upsert::{upsert_vacancy, vacancy_from_row, VACANCY_COLUMNS};
use crate::storage::{Area, Vacancy};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        tracing::debug!(path = %path.display(), "Opened vacancy database");

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, table: &str) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }
}

impl Storage for SqliteStorage {
    // ===== Writes =====

    fn store_page(&mut self, records: &[DetailRecord]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        for record in records {
            upsert_vacancy(&tx, record)?;
        }
        tx.commit()?;

        Ok(records.len())
    }

    // ===== Vacancies =====

    fn get_vacancy(&self, vacancy_id: i64) -> StorageResult<Option<Vacancy>> {
        let vacancy = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM vacancies WHERE vacancy_id = ?1",
                    VACANCY_COLUMNS
                ),
                params![vacancy_id],
                vacancy_from_row,
            )
            .optional()?;
        Ok(vacancy)
    }

    fn vacancy_skills(&self, vacancy_db_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name FROM vacancy_skills vs
             JOIN skills s ON s.id = vs.skill_id
             WHERE vs.vacancy_db_id = ?1
             ORDER BY s.name",
        )?;

        let names = stmt
            .query_map(params![vacancy_db_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn list_vacancies(&self, limit: usize) -> StorageResult<Vec<Vacancy>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM vacancies ORDER BY id LIMIT ?1",
            VACANCY_COLUMNS
        ))?;

        let vacancies = stmt
            .query_map(params![limit as i64], vacancy_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vacancies)
    }

    // ===== Reference data =====

    fn get_area_by_name(&self, name: &str) -> StorageResult<Option<Area>> {
        let area = self
            .conn
            .query_row(
                "SELECT id, name FROM areas WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Area {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(area)
    }

    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name, COUNT(vs.id) AS uses FROM skills s
             JOIN vacancy_skills vs ON vs.skill_id = s.id
             GROUP BY s.id
             ORDER BY uses DESC, s.name
             LIMIT ?1",
        )?;

        let skills = stmt
            .query_map(params![limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(skills)
    }

    // ===== Counts =====

    fn count_vacancies(&self) -> StorageResult<i64> {
        self.count("vacancies")
    }

    fn count_employers(&self) -> StorageResult<i64> {
        self.count("employers")
    }

    fn count_areas(&self) -> StorageResult<i64> {
        self.count("areas")
    }

    fn count_skills(&self) -> StorageResult<i64> {
        self.count("skills")
    }

    fn count_skill_links(&self) -> StorageResult<i64> {
        self.count("vacancy_skills")
    }
}
