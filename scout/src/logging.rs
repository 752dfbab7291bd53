//! Diagnostic logging setup.
//!
//! The library logs through `tracing`; the binary installs a compact
//! subscriber on stderr. `RUST_LOG` takes standard `EnvFilter` directives
//! and overrides the level derived from `-v`.

use crate::context::VerbosityLevel;
use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "RUST_LOG";

/// Builds the filter for `verbosity`, letting `RUST_LOG` take over when set.
pub fn build_filter(verbosity: VerbosityLevel, env_directives: Option<&str>) -> EnvFilter {
    match env_directives {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::builder()
            .parse(directives)
            .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
        _ => EnvFilter::new(verbosity.log_filter()),
    }
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(verbosity: VerbosityLevel) {
    let env_directives = std::env::var(LOG_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity, env_directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(verbosity >= VerbosityLevel::VeryVerbose)
        .compact()
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
