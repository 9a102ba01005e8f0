//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`. Calling this more than once is harmless;
/// later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging with a default filter used when `RUST_LOG` is unset
pub fn init_with_default(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}
