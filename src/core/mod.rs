//! Shared infrastructure for icu4c-dist
//!
//! - **config**: optional `icu4c-dist.toml` parsing and validation
//! - **error**: error types with contextual help messages and exit codes
//! - **logging**: `tracing` subscriber setup
//! - **process**: external command description and execution

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
