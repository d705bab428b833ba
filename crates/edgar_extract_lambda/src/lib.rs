//! AWS-oriented adapters and handlers for filing extraction.
//!
//! This crate owns runtime integration details: the Lambda and local HTTP
//! entry points, the request router, the extraction unit, and the storage and
//! extraction adapters it is composed from. Domain contracts live in
//! `edgar_extract_core`.

pub mod adapters;
pub mod composition;
pub mod config;
pub mod handlers;
pub mod router;
pub mod telemetry;
