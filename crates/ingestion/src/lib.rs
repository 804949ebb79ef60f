//! Payload ingestion and normalization for the MEGRIBI dashboard.
//!
//! This crate handles:
//! - Timestamp parsing (offset-aware and local naive forms)
//! - Range/forecast JSON envelope decoding
//! - Row to point normalization, dropping malformed rows

pub mod timestamp;
pub mod payload;
pub mod decoder;

pub use timestamp::parse_timestamp;
pub use payload::{parse_forecast_payload, parse_range_payload};
pub use decoder::{DecodeStats, PayloadDecoder};
