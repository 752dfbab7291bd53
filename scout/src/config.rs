//! Configuration file location.
//!
//! The file format and layering live in `libscout::config`; the binary only
//! decides where the file is.

use std::env;
use std::path::PathBuf;

/// Returns the configuration file path.
///
/// `SCOUT_CONFIG` wins; otherwise `<config dir>/scout/config.yaml`, falling
/// back to `config.yaml` in the working directory.
pub fn get_config_path() -> PathBuf {
    if let Ok(config_path) = env::var("SCOUT_CONFIG") {
        return PathBuf::from(config_path);
    }

    // Default to ~/.config/scout/config.yaml
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("scout").join("config.yaml")
    } else {
        PathBuf::from("config.yaml")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
