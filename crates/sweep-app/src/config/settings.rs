//! Settings file loading

use std::path::Path;

use super::types::Settings;
use sweep_core::prelude::*;

/// Settings file looked up in the working directory
pub const CONFIG_FILENAME: &str = "storage-sweep.toml";

/// Load settings from `path`.
///
/// A missing file yields defaults. An unreadable or invalid file is logged and
/// also yields defaults.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Settings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Settings::default()
        }
    }
}
