//! Shared filing extraction domain primitives.
//!
//! This crate owns the record and request contracts, request normalization,
//! the cross-origin policy model, and the storage attribute layout. It
//! excludes AWS SDK, Lambda runtime, and HTTP client concerns; those live in
//! `edgar_extract_lambda`.

pub mod contract;
pub mod cors;
pub mod outputs;
pub mod schema;
