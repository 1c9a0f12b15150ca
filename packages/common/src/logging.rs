//! Structured logging infrastructure
//!
//! Provides env_logger-based logging with secure handling of identifiers.
//! Library crates emit `tracing` events with the `log` feature enabled, so
//! installing the logger here is enough to see them without a subscriber.

use log::info;
use sha2::{Digest, Sha256};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Length of the hex digest prefix kept by [`fingerprint`].
const FINGERPRINT_HEX_LEN: usize = 12;

/// Logging setup using `env_logger`
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via `RUST_LOG` environment variable:
    /// - `RUST_LOG=debug` - Enable all debug logs
    /// - `RUST_LOG=jwtkit=trace` - Token-level detail from the core crate
    /// - `RUST_LOG=error` - Only errors
    ///
    /// Does nothing if another logger is already installed.
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            let installed = env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .format_target(true)
                .try_init()
                .is_ok();

            if installed {
                info!(
                    target: "jwtkit",
                    "jwtkit logging ready, token events are emitted under the `jwtkit` target"
                );
            }
        });
    }

    /// Initialize logging for test environments
    ///
    /// Safe to call from every test; later calls are no-ops.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }
}

/// Cryptographically secure identifier hashing for logging
///
/// Returns `#` followed by the first 12 hex characters of the SHA-256 digest,
/// so identifiers stay correlatable across log lines without being exposed.
pub fn fingerprint(value: &str) -> String {
    let hash = Sha256::digest(value.as_bytes());
    let hex_hash = format!("{hash:x}");
    format!("#{}", &hex_hash[..FINGERPRINT_HEX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::debug;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        LoggingTransformer::init_test();

        let first = fingerprint("key-2024-01");
        let second = fingerprint("key-2024-02");

        assert_ne!(first, second);
        assert_eq!(first, fingerprint("key-2024-01"));

        assert!(first.starts_with('#'));
        assert_eq!(first.len(), 13);
    }

    #[test]
    fn test_fingerprint_of_empty_input() {
        // sha256("") = e3b0c442 98fc1c14 ...
        assert_eq!(fingerprint(""), "#e3b0c44298fc");
    }

    #[test]
    fn test_init_after_test_logger_does_not_panic() {
        LoggingTransformer::init_test();
        LoggingTransformer::init();
        LoggingTransformer::init();
        assert!(INIT_LOGGER.is_completed());
    }

    #[test]
    fn test_init_test_is_idempotent() {
        LoggingTransformer::init_test();
        LoggingTransformer::init_test();
        debug!("kid_hash: {}", fingerprint("primary"));
    }
}
