//! Audio settings propagation for scene audio sources.
//!
//! Stores the scene's audio settings (distance models, rolloff factors, cone
//! angles) and pushes them onto registered media and avatar sources whenever
//! the settings or the global preferences change.
//!
//! # Architecture
//!
//! - [`AudioSettingsSystem`] - Registry of sources plus the current snapshot
//! - [`AudioSettings`] / [`AudioSettingsPatch`] - Snapshot and partial updates
//! - [`PreferenceSource`] - Access to the host's global preference store
//! - [`AudioSourceSink`] - Where per-source payloads are delivered
//!
//! # Example
//!
//! ```ignore
//! let mut audio = AudioSettingsSystem::new(PreferenceStore::default());
//! audio.register_media(video, &mut sink);
//! audio.update_settings(&AudioSettingsPatch { media_rolloff_factor: Some(3.0), ..Default::default() }, &mut sink);
//! ```

mod params;
mod preferences;
mod settings;
mod system;

pub use params::{AudioSourceSink, AvatarAudioParams, MediaAudioParams};
pub use preferences::{
    ListenerId, PinnedPreferences, PreferenceListener, PreferenceSource, PreferenceStore,
    Preferences, PreferencesPatch, SharedPreferenceStore,
};
pub use settings::{AudioSettings, AudioSettingsPatch};
pub use system::AudioSettingsSystem;

use thiserror::Error;

/// Errors raised while decoding host-provided audio state.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The JSON did not match the expected shape.
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// What was being decoded.
        what: &'static str,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}
