//! Integration tests for greenlight
//!
//! These tests drive the auth system over a real migrated SQLite store and
//! through the HTTP surface, without mocking.

pub mod admission_tests;
pub mod database_tests;
pub mod gate_tests;
pub mod http_tests;
pub mod token_flow_tests;
