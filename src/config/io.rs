//! Config I/O: lenient load, explicit save.

use std::path::PathBuf;

use tracing::warn;

use super::Config;

/// Config file lives under the platform config dir.
pub fn config_path() -> PathBuf {
    let dir = dirs::config_dir().unwrap_or_default().join("airdrop-hub");
    let _ = std::fs::create_dir_all(&dir);
    dir.join("config.json")
}

/// Load the config from disk. A missing, unreadable, or malformed file
/// falls back to defaults rather than failing startup.
pub fn load_config() -> Config {
    let path = config_path();

    if !path.exists() {
        return Config::default();
    }

    let data = match std::fs::read_to_string(&path) {
        Ok(d) => d,
        Err(e) => {
            warn!("failed to read {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!("malformed config, using defaults: {}", e);
            Config::default()
        }
    }
}

/// Write the config back to disk. Failures are logged, not propagated;
/// losing a settings write should never take the app down.
pub fn save_config(config: &Config) {
    let path = config_path();
    match serde_json::to_string_pretty(config) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                warn!("failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => warn!("failed to serialize config: {}", e),
    }
}
