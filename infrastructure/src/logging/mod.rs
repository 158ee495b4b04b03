//! Logging infrastructure.
//!
//! - [`init_tracing`]: `tracing` subscriber for human-readable diagnostics
//! - [`JsonlEventLogger`]: JSONL file writer implementing the
//!   [`EventObserver`](conclave_application::EventObserver) port

mod jsonl_logger;

pub use jsonl_logger::JsonlEventLogger;

use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level
fn verbosity_filter(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `verbosity` when set. Returns `false` if a
/// subscriber was already installed.
pub fn init_tracing(verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| verbosity_filter(verbosity));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter_levels() {
        assert_eq!(verbosity_filter(0).to_string(), "warn");
        assert_eq!(verbosity_filter(1).to_string(), "info");
        assert_eq!(verbosity_filter(2).to_string(), "debug");
        assert_eq!(verbosity_filter(7).to_string(), "trace");
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        let _ = init_tracing(0);
        assert!(!init_tracing(1));
    }
}
