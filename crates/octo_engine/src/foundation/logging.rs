//! Logging utilities and structured logging support
//!
//! The engine reports every recoverable misconfiguration through the `log`
//! facade. Hosts pick the backend; `env_logger` is the default one.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with a default filter
///
/// `RUST_LOG` still wins when it is set, so developers can raise verbosity
/// without touching the configuration file.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Check whether a string names a `log` level filter
pub fn is_valid_level(level: &str) -> bool {
    level.parse::<log::LevelFilter>().is_ok()
}
