//! Find-or-create persistence of detail records
//!
//! Every function here works on a borrowed connection so the caller decides
//! the transaction boundary. [`upsert_vacancy`] takes a `Transaction`
//! explicitly because it issues several dependent writes that must land
//! together.

use crate::record::DetailRecord;
use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::{area_id_for_name, Area, Employer, Skill, Vacancy};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

/// Column list matching [`vacancy_from_row`]
pub(crate) const VACANCY_COLUMNS: &str = "id, vacancy_id, name, published_at, created_at, \
     salary_from, salary_to, salary_currency, schedule, employment, experience, url, \
     employer_id, area_id";

/// Looks up an employer by name, creating it on first sight
///
/// Returns `None` for a missing or blank name.
pub fn find_or_create_employer(
    conn: &Connection,
    name: Option<&str>,
) -> StorageResult<Option<Employer>> {
    let Some(name) = non_blank(name) else {
        return Ok(None);
    };

    let existing = conn
        .query_row(
            "SELECT id, name FROM employers WHERE id = ?1",
            params![name],
            |row| {
                Ok(Employer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    if let Some(employer) = existing {
        return Ok(Some(employer));
    }

    conn.execute(
        "INSERT INTO employers (id, name) VALUES (?1, ?2)",
        params![name, name],
    )?;
    tracing::debug!(employer = name, "Created employer");

    Ok(Some(Employer {
        id: name.to_string(),
        name: name.to_string(),
    }))
}

/// Looks up an area by name, creating it with a name-derived id
///
/// Returns `None` for a missing or blank name. Two distinct names that
/// reduce to the same id are reported as [`StorageError::AreaIdCollision`]
/// instead of silently sharing a row.
pub fn find_or_create_area(conn: &Connection, name: Option<&str>) -> StorageResult<Option<Area>> {
    let Some(name) = non_blank(name) else {
        return Ok(None);
    };

    let existing = conn
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
    if let Some(area) = existing {
        return Ok(Some(area));
    }

    let id = area_id_for_name(name);
    let taken: Option<String> = conn
        .query_row("SELECT name FROM areas WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    if let Some(existing) = taken {
        return Err(StorageError::AreaIdCollision {
            id,
            name: name.to_string(),
            existing,
        });
    }

    conn.execute(
        "INSERT INTO areas (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;
    tracing::debug!(area = name, area_id = id, "Created area");

    Ok(Some(Area {
        id,
        name: name.to_string(),
    }))
}

/// Looks up a skill by name, creating it on first sight
pub fn find_or_create_skill(conn: &Connection, name: &str) -> StorageResult<Skill> {
    conn.execute(
        "INSERT OR IGNORE INTO skills (name) VALUES (?1)",
        params![name],
    )?;

    let skill = conn.query_row(
        "SELECT id, name FROM skills WHERE name = ?1",
        params![name],
        |row| {
            Ok(Skill {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )?;

    Ok(skill)
}

/// Writes one detail record into the open transaction
///
/// An existing vacancy with the same site id is updated in place: its
/// surrogate id and `created_at` stay, every other column is overwritten.
/// The skill links are then replaced wholesale by the record's skills.
/// Nothing is committed here.
pub fn upsert_vacancy(tx: &Transaction<'_>, record: &DetailRecord) -> StorageResult<Vacancy> {
    let employer = find_or_create_employer(tx, record.employer_name.as_deref())?;
    let area = find_or_create_area(tx, record.area_name.as_deref())?;
    let employer_id = employer.map(|e| e.id);
    let area_id = area.map(|a| a.id);
    let published_at = record.published_at.to_rfc3339();

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM vacancies WHERE vacancy_id = ?1",
            params![record.vacancy_id],
            |row| row.get(0),
        )
        .optional()?;

    let db_id = match existing {
        Some(db_id) => {
            tx.execute(
                "UPDATE vacancies SET name = ?1, published_at = ?2, salary_from = ?3,
                 salary_to = ?4, salary_currency = ?5, schedule = ?6, employment = ?7,
                 experience = ?8, url = ?9, employer_id = ?10, area_id = ?11
                 WHERE id = ?12",
                params![
                    record.name,
                    published_at,
                    record.salary_from,
                    record.salary_to,
                    record.salary_currency,
                    record.schedule,
                    record.employment,
                    record.experience,
                    record.url,
                    employer_id,
                    area_id,
                    db_id,
                ],
            )?;
            tracing::trace!(vacancy_id = record.vacancy_id, "Updated vacancy");
            db_id
        }
        None => {
            let now = Utc::now().to_rfc3339();
            tx.execute(
                "INSERT INTO vacancies (vacancy_id, name, published_at, created_at, salary_from,
                 salary_to, salary_currency, schedule, employment, experience, url,
                 employer_id, area_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.vacancy_id,
                    record.name,
                    published_at,
                    now,
                    record.salary_from,
                    record.salary_to,
                    record.salary_currency,
                    record.schedule,
                    record.employment,
                    record.experience,
                    record.url,
                    employer_id,
                    area_id,
                ],
            )?;
            tracing::trace!(vacancy_id = record.vacancy_id, "Inserted vacancy");
            tx.last_insert_rowid()
        }
    };

    replace_skills(tx, db_id, &record.skills)?;

    tx.query_row(
        &format!("SELECT {} FROM vacancies WHERE id = ?1", VACANCY_COLUMNS),
        params![db_id],
        vacancy_from_row,
    )
    .optional()?
    .ok_or(StorageError::VacancyNotFound(record.vacancy_id))
}

fn replace_skills(conn: &Connection, vacancy_db_id: i64, skills: &[String]) -> StorageResult<()> {
    conn.execute(
        "DELETE FROM vacancy_skills WHERE vacancy_db_id = ?1",
        params![vacancy_db_id],
    )?;

    for name in skills {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let skill = find_or_create_skill(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO vacancy_skills (vacancy_db_id, skill_id) VALUES (?1, ?2)",
            params![vacancy_db_id, skill.id],
        )?;
    }

    Ok(())
}

/// Maps a row selected with [`VACANCY_COLUMNS`]
pub(crate) fn vacancy_from_row(row: &Row<'_>) -> rusqlite::Result<Vacancy> {
    Ok(Vacancy {
        id: row.get(0)?,
        vacancy_id: row.get(1)?,
        name: row.get(2)?,
        published_at: timestamp_column(row, 3)?,
        created_at: timestamp_column(row, 4)?,
        salary_from: row.get(5)?,
        salary_to: row.get(6)?,
        salary_currency: row.get(7)?,
        schedule: row.get(8)?,
        employment: row.get(9)?,
        experience: row.get(10)?,
        url: row.get(11)?,
        employer_id: row.get(12)?,
        area_id: row.get(13)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}
