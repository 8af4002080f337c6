use anyhow::Result;
use scenesound_audio::{AudioSettingsPatch, Preferences};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/audio.toml";

/// Startup configuration for the headless scene driver.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Number of media entities to spawn.
    pub media_sources: usize,
    /// Number of avatar entities to spawn.
    pub avatar_sources: usize,
    /// Number of frames to run.
    pub frames: u64,
    /// Initial contents of the preference store, before pinning.
    pub preferences: Preferences,
    /// Scene audio settings applied on the first frame.
    pub scene: AudioSettingsPatch,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            media_sources: 2,
            avatar_sources: 2,
            frames: 4,
            preferences: Preferences::default(),
            scene: AudioSettingsPatch::default(),
        }
    }
}

impl AudioConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AudioConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AudioConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Audio config not found at {}. Using defaults",
                        path.display()
                    );
                }
                AudioConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}
