//! Logging setup and re-exports

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system.
///
/// Safe to call more than once; later calls are no-ops (tests and embedding
/// hosts may both try to install a logger).
pub fn init() {
    let _ = env_logger::try_init();
}
