//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::DetailRecord;
use crate::storage::{Area, Vacancy};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unsupported database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Database does not exist: {0}")]
    DatabaseNotFound(String),

    #[error("Vacancy not found: {0}")]
    VacancyNotFound(i64),

    #[error("Area id {id} for {name:?} is already taken by {existing:?}")]
    AreaIdCollision {
        id: i64,
        name: String,
        existing: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes go through [`Storage::store_page`], which persists one page of
/// detail records atomically. The read side exists for statistics and
/// for verifying stored state.
pub trait Storage {
    // ===== Writes =====

    /// Upserts every record of a page inside a single transaction
    ///
    /// Records are applied in slice order. Any failure rolls the whole
    /// page back.
    ///
    /// # Returns
    ///
    /// The number of vacancies written
    fn store_page(&mut self, records: &[DetailRecord]) -> StorageResult<usize>;

    // ===== Vacancies =====

    /// Gets a vacancy by its site id
    fn get_vacancy(&self, vacancy_id: i64) -> StorageResult<Option<Vacancy>>;

    /// Names of the skills currently linked to a vacancy, sorted
    fn vacancy_skills(&self, vacancy_db_id: i64) -> StorageResult<Vec<String>>;

    /// Lists vacancies ordered by surrogate id
    fn list_vacancies(&self, limit: usize) -> StorageResult<Vec<Vacancy>>;

    // ===== Reference data =====

    /// Gets an area by its display name
    fn get_area_by_name(&self, name: &str) -> StorageResult<Option<Area>>;

    /// Skills ordered by how many vacancies link to them
    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, i64)>>;

    // ===== Counts =====

    fn count_vacancies(&self) -> StorageResult<i64>;

    fn count_employers(&self) -> StorageResult<i64>;

    fn count_areas(&self) -> StorageResult<i64>;

    fn count_skills(&self) -> StorageResult<i64>;

    fn count_skill_links(&self) -> StorageResult<i64>;
}
