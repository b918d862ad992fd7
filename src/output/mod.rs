//! Output module for inspecting stored vacancies
//!
//! This module handles the `--stats` report: table counts, the most
//! requested skills and a sample of vacancies with their salaries.

pub mod stats;

pub use stats::{
    format_statistics, load_statistics, print_statistics, DatabaseStatistics, TableCounts,
};
