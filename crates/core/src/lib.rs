//! Core types and configuration for the MEGRIBI dashboard.
//!
//! This crate provides shared types used across all other crates:
//! - Attendance samples (actual and forecast rows, parsed points)
//! - Night windows and reconciled chart points
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
