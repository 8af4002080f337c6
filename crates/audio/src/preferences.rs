//! Global audio preferences and the store that holds them.
//!
//! The store is process-wide state owned by the host. The settings system only
//! reads three fields from it, subscribes to changes, and writes the
//! [`PinnedPreferences`] once at startup.

use crate::AudioError;
use scenesound_core::{AudioOutputMode, DistanceModel};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Audio preferences as stored by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Stereo or panned output for avatar voices.
    pub audio_output_mode: AudioOutputMode,
    /// Multiplier applied to every rolloff factor.
    pub global_rolloff_factor: f32,
    /// Distance model forced onto both media and avatar sources.
    pub global_distance_model: DistanceModel,
    /// Loudness normalization amount (0.0 disables it).
    pub audio_normalization: f32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            audio_output_mode: AudioOutputMode::Panner,
            global_rolloff_factor: 1.0,
            global_distance_model: DistanceModel::Inverse,
            audio_normalization: 0.0,
        }
    }
}

impl Preferences {
    /// Decode preferences from the host's JSON state. Missing fields take defaults.
    pub fn from_json(input: &str) -> Result<Self, AudioError> {
        serde_json::from_str(input).map_err(|source| AudioError::Decode {
            what: "preferences",
            source,
        })
    }
}

/// A partial preference update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesPatch {
    /// See [`Preferences::audio_output_mode`].
    pub audio_output_mode: Option<AudioOutputMode>,
    /// See [`Preferences::global_rolloff_factor`].
    pub global_rolloff_factor: Option<f32>,
    /// See [`Preferences::global_distance_model`].
    pub global_distance_model: Option<DistanceModel>,
    /// See [`Preferences::audio_normalization`].
    pub audio_normalization: Option<f32>,
}

impl PreferencesPatch {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch on top of `base`.
    ///
    /// Non-finite numbers are dropped and the base value is kept.
    pub fn merge_over(&self, base: &Preferences) -> Preferences {
        Preferences {
            audio_output_mode: self.audio_output_mode.unwrap_or(base.audio_output_mode),
            global_rolloff_factor: finite_or(
                "global_rolloff_factor",
                self.global_rolloff_factor,
                base.global_rolloff_factor,
            ),
            global_distance_model: self
                .global_distance_model
                .unwrap_or(base.global_distance_model),
            audio_normalization: finite_or(
                "audio_normalization",
                self.audio_normalization,
                base.audio_normalization,
            ),
        }
    }

    /// Decode a patch from JSON.
    pub fn from_json(input: &str) -> Result<Self, AudioError> {
        serde_json::from_str(input).map_err(|source| AudioError::Decode {
            what: "preferences patch",
            source,
        })
    }
}

fn finite_or(field: &'static str, value: Option<f32>, base: f32) -> f32 {
    match value {
        Some(value) if value.is_finite() => value,
        Some(value) => {
            warn!(field, value, "ignoring non-finite preference value");
            base
        }
        None => base,
    }
}

/// Callback invoked with the new preferences after a change.
pub type PreferenceListener = Box<dyn FnMut(&Preferences) + Send>;

/// Handle returned by [`PreferenceSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Read/write access to the host's preference store.
pub trait PreferenceSource {
    /// Current preferences.
    fn get(&self) -> Preferences;

    /// Apply `patch`. Listeners run only if a value actually changed.
    fn update(&mut self, patch: &PreferencesPatch);

    /// Register a change listener.
    ///
    /// Listeners run while the store is borrowed and must not call back into it.
    fn subscribe(&mut self, listener: PreferenceListener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;
}

/// In-memory preference store.
pub struct PreferenceStore {
    preferences: Preferences,
    listeners: Vec<(ListenerId, PreferenceListener)>,
    next_listener: u64,
}

impl PreferenceStore {
    /// Create a store holding `preferences`.
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Borrow the current preferences.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Wrap the store for sharing across owners.
    pub fn into_shared(self) -> SharedPreferenceStore {
        SharedPreferenceStore {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("preferences", &self.preferences)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PreferenceSource for PreferenceStore {
    fn get(&self) -> Preferences {
        self.preferences.clone()
    }

    fn update(&mut self, patch: &PreferencesPatch) {
        let next = patch.merge_over(&self.preferences);
        if next == self.preferences {
            return;
        }
        self.preferences = next;
        debug!(
            listeners = self.listeners.len(),
            "preferences changed: {:?}", self.preferences
        );
        for (_, listener) in &mut self.listeners {
            listener(&self.preferences);
        }
    }

    fn subscribe(&mut self, listener: PreferenceListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}

/// A cloneable handle to one [`PreferenceStore`].
///
/// Every clone sees the same preferences and listeners, so settings UI and the
/// settings system can each hold one.
#[derive(Clone, Debug, Default)]
pub struct SharedPreferenceStore {
    inner: Arc<Mutex<PreferenceStore>>,
}

impl SharedPreferenceStore {
    /// Create a shared store holding `preferences`.
    pub fn new(preferences: Preferences) -> Self {
        PreferenceStore::new(preferences).into_shared()
    }

    fn lock(&self) -> MutexGuard<'_, PreferenceStore> {
        // A listener that panicked leaves the preferences themselves intact.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listener_count()
    }
}

impl PreferenceSource for SharedPreferenceStore {
    fn get(&self) -> Preferences {
        self.lock().get()
    }

    fn update(&mut self, patch: &PreferencesPatch) {
        self.lock().update(patch);
    }

    fn subscribe(&mut self, listener: PreferenceListener) -> ListenerId {
        self.lock().subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.lock().unsubscribe(id)
    }
}

/// Corrective preference writes applied once when the settings system starts.
///
/// Some preference values are not supported by the scene runtime and are forced
/// back to known-good values. `None` leaves a field alone.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedPreferences {
    /// Output mode to force. The default pins [`AudioOutputMode::Panner`].
    pub audio_output_mode: Option<AudioOutputMode>,
    /// Global rolloff factor to force. The default pins 1.0.
    pub global_rolloff_factor: Option<f32>,
    /// Normalization amount to force. The default pins 0.0 (disabled).
    pub audio_normalization: Option<f32>,
}

impl Default for PinnedPreferences {
    fn default() -> Self {
        Self {
            audio_output_mode: Some(AudioOutputMode::Panner),
            global_rolloff_factor: Some(1.0),
            audio_normalization: Some(0.0),
        }
    }
}

impl PinnedPreferences {
    /// A policy that pins nothing.
    pub fn none() -> Self {
        Self {
            audio_output_mode: None,
            global_rolloff_factor: None,
            audio_normalization: None,
        }
    }

    /// The subset of pins that differ from `current`.
    pub fn corrections(&self, current: &Preferences) -> PreferencesPatch {
        PreferencesPatch {
            audio_output_mode: self
                .audio_output_mode
                .filter(|mode| *mode != current.audio_output_mode),
            global_rolloff_factor: self
                .global_rolloff_factor
                .filter(|factor| *factor != current.global_rolloff_factor),
            global_distance_model: None,
            audio_normalization: self
                .audio_normalization
                .filter(|amount| *amount != current.audio_normalization),
        }
    }

    /// Write the differing pins into `source`. Returns what was written.
    pub fn apply<P: PreferenceSource + ?Sized>(&self, source: &mut P) -> PreferencesPatch {
        let corrections = self.corrections(&source.get());
        if !corrections.is_empty() {
            source.update(&corrections);
        }
        corrections
    }
}
