//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables (`SCOUT_*`)
//! 4. CLI flags (applied per command)
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::config;
use crate::format::ColorChoice;
use libscout::Config;
use std::path::{Path, PathBuf};

/// How much diagnostic output to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    #[default]
    Normal,
    /// `-v`
    Verbose,
    /// `-vv`
    VeryVerbose,
    /// `-vvv` and above
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Default tracing filter directive for this level.
    pub fn log_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::VeryVerbose => "debug",
            VerbosityLevel::Trace => "trace",
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    pub config_path: PathBuf,
    pub color: ColorChoice,
    pub verbosity: VerbosityLevel,
    /// Set when the config file existed but could not be read
    pub config_error: Option<String>,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars
    pub fn build(color: ColorChoice, verbosity: VerbosityLevel) -> Self {
        Self::build_from(&config::get_config_path(), color, verbosity)
    }

    /// Build context from an explicit config file path.
    pub fn build_from(config_path: &Path, color: ColorChoice, verbosity: VerbosityLevel) -> Self {
        let (config, config_error) = match Config::load(Some(config_path)) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e.to_string())),
        };

        Self {
            config,
            config_path: config_path.to_path_buf(),
            color,
            verbosity,
            config_error,
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
