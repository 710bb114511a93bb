//! Log output for hosts embedding the runtime.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives, e.g. `spy_runtime=trace`.
pub const LOG_ENV: &str = "SPY_LOG";

const DEFAULT_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Install a `fmt` subscriber writing to stderr, filtered by `SPY_LOG`.
///
/// Safe to call more than once. If the host already installed a global
/// subscriber, that one is left in place.
pub fn init() {
    INIT.call_once(|| {
        let filter = filter_from_env();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::warn!("logging initialised twice without panicking");
    }
}
