//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the job site and run the
//! full crawl cycle end-to-end against a temporary database.

mod common;
mod crawl_tests;
mod persistence_tests;
