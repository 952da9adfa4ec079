//! API integration tests
//!
//! Integration tests for the REST endpoints

#[cfg(feature = "ssr")]
mod routes_test;
