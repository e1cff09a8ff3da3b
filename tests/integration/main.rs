//! Integration tests for the extraction pipeline
//!
//! These tests use wiremock to serve Filmow-like pages and run the
//! fetcher, discovery and orchestrator end-to-end.

mod common;
mod export_tests;
mod fetch_tests;
