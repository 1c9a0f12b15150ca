//! Shared infrastructure for the jwtkit crates.
//!
//! Currently this is the logging layer: logger initialization for binaries
//! and tests, and privacy-preserving fingerprints for identifiers that end up
//! in log records.

pub mod logging;

pub use logging::{fingerprint, LoggingTransformer};
