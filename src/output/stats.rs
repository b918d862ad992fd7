//! Statistics generation from the vacancy database
//!
//! This module provides functionality for extracting and displaying
//! what a crawl has stored so far.

use crate::storage::{Storage, StorageResult, Vacancy};
use std::fmt::Write;

/// How many vacancies are listed in the sample
pub const SAMPLE_VACANCIES: usize = 10;

/// How many skills are listed in the ranking
pub const TOP_SKILLS: usize = 10;

/// Row counts of every table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub vacancies: i64,
    pub employers: i64,
    pub areas: i64,
    pub skills: i64,
    pub vacancy_skills: i64,
}

/// Database statistics summary
#[derive(Debug, Clone)]
pub struct DatabaseStatistics {
    pub counts: TableCounts,

    /// Skill names with the number of vacancies asking for them
    pub top_skills: Vec<(String, i64)>,

    /// First stored vacancies, oldest first
    pub sample: Vec<Vacancy>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(DatabaseStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<DatabaseStatistics> {
    let counts = TableCounts {
        vacancies: storage.count_vacancies()?,
        employers: storage.count_employers()?,
        areas: storage.count_areas()?,
        skills: storage.count_skills()?,
        vacancy_skills: storage.count_skill_links()?,
    };

    Ok(DatabaseStatistics {
        counts,
        top_skills: storage.top_skills(TOP_SKILLS)?,
        sample: storage.list_vacancies(SAMPLE_VACANCIES)?,
    })
}

/// Renders statistics as plain text
pub fn format_statistics(stats: &DatabaseStatistics) -> String {
    let mut out = String::new();
    let c = &stats.counts;

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Vacancy Database ===\n");
    let _ = writeln!(out, "Tables:");
    let _ = writeln!(out, "  vacancies: {}", c.vacancies);
    let _ = writeln!(out, "  employers: {}", c.employers);
    let _ = writeln!(out, "  areas: {}", c.areas);
    let _ = writeln!(out, "  skills: {}", c.skills);
    let _ = writeln!(out, "  vacancy_skills: {}", c.vacancy_skills);
    let _ = writeln!(out);

    if !stats.top_skills.is_empty() {
        let _ = writeln!(out, "Top Skills:");
        for (name, uses) in &stats.top_skills {
            let _ = writeln!(out, "  {}: {}", name, uses);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Vacancies (first {}):", SAMPLE_VACANCIES);
    if stats.sample.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for vacancy in &stats.sample {
        let _ = writeln!(out, "  {} | {}", vacancy.name, format_salary(vacancy));
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatabaseStatistics) {
    print!("{}", format_statistics(stats));
}

fn format_salary(vacancy: &Vacancy) -> String {
    let currency = vacancy.salary_currency.as_deref().unwrap_or("");
    let salary = match (vacancy.salary_from, vacancy.salary_to) {
        (Some(from), Some(to)) if from == to => format!("{}", from),
        (Some(from), Some(to)) => format!("{} - {}", from, to),
        (Some(from), None) => format!("from {}", from),
        (None, Some(to)) => format!("up to {}", to),
        (None, None) => return "salary not specified".to_string(),
    };
    format!("{} {}", salary, currency).trim_end().to_string()
}
