// Shared helpers for the integration tests in `tests/`.
#![allow(dead_code)]

pub mod fixtures;

/// Route `log` output through the test harness. Safe to call from every
/// test; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
