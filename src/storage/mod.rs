//! Storage module for persisting vacancies
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Find-or-create of employers, areas and skills
//! - Idempotent upsert of vacancies keyed by their site id
//! - Read access used by statistics and tests

mod schema;
mod sqlite;
mod traits;
mod upsert;

pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};
pub use upsert::{find_or_create_area, find_or_create_employer, find_or_create_skill, upsert_vacancy};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Area ids are reduced into `0..AREA_ID_MODULUS`
pub const AREA_ID_MODULUS: u64 = 1_000_000_000;

/// Opens the database named by a `sqlite://` URL or a plain path
///
/// The schema is created on first use.
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Unsupported URL or database failure
pub fn open_storage(database_url: &str) -> StorageResult<SqliteStorage> {
    match DatabaseTarget::parse(database_url)? {
        DatabaseTarget::File(path) => SqliteStorage::new(&path),
        DatabaseTarget::Memory => SqliteStorage::new_in_memory(),
    }
}

/// Opens a database that must already exist
///
/// Used for read-only inspection, where a mistyped path should fail
/// instead of creating an empty database.
pub fn open_existing_storage(database_url: &str) -> StorageResult<SqliteStorage> {
    match DatabaseTarget::parse(database_url)? {
        DatabaseTarget::File(path) if !path.is_file() => {
            Err(StorageError::DatabaseNotFound(path.display().to_string()))
        }
        DatabaseTarget::File(path) => SqliteStorage::new(&path),
        DatabaseTarget::Memory => SqliteStorage::new_in_memory(),
    }
}

/// Where the vacancy database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    Memory,
}

impl DatabaseTarget {
    /// Interprets a database URL
    ///
    /// Accepted forms:
    /// - `sqlite:///relative/path.db` (three slashes: relative path)
    /// - `sqlite:////absolute/path.db` (four slashes: absolute path)
    /// - `sqlite://:memory:` or `:memory:`
    /// - any string without a scheme, taken as a filesystem path
    pub fn parse(database_url: &str) -> StorageResult<Self> {
        let url = database_url.trim();
        if url.is_empty() {
            return Err(StorageError::InvalidDatabaseUrl(database_url.to_string()));
        }
        if url == ":memory:" {
            return Ok(Self::Memory);
        }

        if let Some(rest) = url.strip_prefix("sqlite://") {
            if rest == ":memory:" || rest == "/:memory:" {
                return Ok(Self::Memory);
            }
            return match rest.strip_prefix('/') {
                Some(path) if !path.is_empty() => Ok(Self::File(PathBuf::from(path))),
                _ => Err(StorageError::InvalidDatabaseUrl(database_url.to_string())),
            };
        }

        if url.contains("://") {
            return Err(StorageError::InvalidDatabaseUrl(database_url.to_string()));
        }

        Ok(Self::File(PathBuf::from(url)))
    }
}

/// Derives the numeric id of an area from its display name
///
/// The id is the first eight bytes of the SHA-256 digest of the UTF-8
/// name, read as a big-endian unsigned integer, reduced modulo
/// [`AREA_ID_MODULUS`]. It is the same on every platform and in every
/// process, so area identity holds across runs.
pub fn area_id_for_name(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % AREA_ID_MODULUS) as i64
}

/// An employer row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employer {
    /// Name-derived key
    pub id: String,
    pub name: String,
}

/// An area (region) row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: i64,
    pub name: String,
}

/// A skill row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

/// A vacancy row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vacancy {
    /// Surrogate id, stable across updates
    pub id: i64,

    /// Site id, unique
    pub vacancy_id: i64,
    pub name: String,
    pub published_at: DateTime<Utc>,

    /// Set on first insert, never updated
    pub created_at: DateTime<Utc>,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub salary_currency: Option<String>,
    pub schedule: Option<String>,
    pub employment: Option<String>,
    pub experience: Option<String>,
    pub url: String,
    pub employer_id: Option<String>,
    pub area_id: Option<i64>,
}

/// A link between a vacancy and one of its skills
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacancySkill {
    pub id: i64,
    pub vacancy_db_id: i64,
    pub skill_id: i64,
}
