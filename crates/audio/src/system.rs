//! The audio settings system: a registry of sources plus the current snapshot.

use crate::{
    AudioSettings, AudioSettingsPatch, AudioSourceSink, AvatarAudioParams, ListenerId,
    MediaAudioParams, PinnedPreferences, PreferenceSource, PreferencesPatch,
};
use scenesound_core::{AudioOutputMode, DistanceModel};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Keeps registered media and avatar sources in sync with the scene's audio
/// settings and the global preferences.
///
/// Handles are held without ownership between register and unregister; the
/// host decides when they come and go. Payloads are delivered through the
/// [`AudioSourceSink`] passed to each call.
pub struct AudioSettingsSystem<H, P: PreferenceSource> {
    preferences: P,
    listener: ListenerId,
    preferences_dirty: Arc<AtomicBool>,
    defaults: AudioSettings,
    settings: AudioSettings,
    media_sources: Vec<H>,
    avatar_sources: Vec<H>,
    /// Cached output mode as of the last change notification.
    audio_output_mode: AudioOutputMode,
    /// Cached global rolloff factor as of the last change notification.
    global_rolloff_factor: f32,
    /// Cached global distance model as of the last change notification.
    global_distance_model: DistanceModel,
}

impl<H, P> AudioSettingsSystem<H, P>
where
    H: Copy + PartialEq + fmt::Debug,
    P: PreferenceSource,
{
    /// Create a system with the stock defaults and pinning policy.
    pub fn new(preferences: P) -> Self {
        Self::with_policy(preferences, AudioSettings::default(), &PinnedPreferences::default())
    }

    /// Create a system with explicit defaults and pinning policy.
    ///
    /// The pins are written to the store before the cached preference values
    /// are read, and the change listener is registered after that, so the
    /// startup correction does not count as a pending change.
    pub fn with_policy(mut preferences: P, defaults: AudioSettings, pins: &PinnedPreferences) -> Self {
        let corrected = pins.apply(&mut preferences);
        if !corrected.is_empty() {
            info!("pinned unsupported audio preferences: {:?}", corrected);
        }

        let current = preferences.get();
        let preferences_dirty = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&preferences_dirty);
        let listener = preferences.subscribe(Box::new(move |_| {
            flag.store(true, Ordering::Release);
        }));

        debug!(
            output_mode = %current.audio_output_mode,
            global_rolloff_factor = current.global_rolloff_factor,
            global_distance_model = %current.global_distance_model,
            "audio settings system initialized"
        );

        Self {
            preferences,
            listener,
            preferences_dirty,
            settings: defaults.clone(),
            defaults,
            media_sources: Vec::new(),
            avatar_sources: Vec::new(),
            audio_output_mode: current.audio_output_mode,
            global_rolloff_factor: current.global_rolloff_factor,
            global_distance_model: current.global_distance_model,
        }
    }

    /// The snapshot currently in effect.
    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    /// The base snapshot every update is merged over.
    pub fn defaults(&self) -> &AudioSettings {
        &self.defaults
    }

    /// The global rolloff factor applied to payloads.
    pub fn global_rolloff_factor(&self) -> f32 {
        self.global_rolloff_factor
    }

    /// Registered media sources, in registration order.
    pub fn media_sources(&self) -> &[H] {
        &self.media_sources
    }

    /// Registered avatar sources, in registration order.
    pub fn avatar_sources(&self) -> &[H] {
        &self.avatar_sources
    }

    /// Whether `handle` is a registered media source.
    pub fn is_media_registered(&self, handle: H) -> bool {
        self.media_sources.contains(&handle)
    }

    /// Whether `handle` is a registered avatar source.
    pub fn is_avatar_registered(&self, handle: H) -> bool {
        self.avatar_sources.contains(&handle)
    }

    /// The preference store.
    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    /// Register a media source and push the current settings to it.
    ///
    /// Registering a handle twice keeps one entry but still re-applies settings.
    /// A preference change still pending from the store is handled first, so
    /// the payload never mixes old and new preference values.
    pub fn register_media<S: AudioSourceSink<H>>(&mut self, handle: H, sink: &mut S) {
        self.poll_preferences(sink);
        if !self.media_sources.contains(&handle) {
            self.media_sources.push(handle);
            debug!(?handle, count = self.media_sources.len(), "registered media source");
        }
        let params = self.media_params();
        sink.apply_media_settings(handle, &params);
    }

    /// Stop tracking a media source. Unknown handles are ignored.
    pub fn unregister_media(&mut self, handle: H) -> bool {
        let removed = remove_handle(&mut self.media_sources, handle);
        if removed {
            debug!(?handle, count = self.media_sources.len(), "unregistered media source");
        }
        removed
    }

    /// Register an avatar source and push the current settings to it.
    ///
    /// Like [`Self::register_media`], a pending preference change is handled
    /// before the payload is built.
    pub fn register_avatar<S: AudioSourceSink<H>>(&mut self, handle: H, sink: &mut S) {
        self.poll_preferences(sink);
        if !self.avatar_sources.contains(&handle) {
            self.avatar_sources.push(handle);
            debug!(?handle, count = self.avatar_sources.len(), "registered avatar source");
        }
        let params = self.avatar_params();
        sink.apply_avatar_settings(handle, &params);
    }

    /// Stop tracking an avatar source. Unknown handles are ignored.
    pub fn unregister_avatar(&mut self, handle: H) -> bool {
        let removed = remove_handle(&mut self.avatar_sources, handle);
        if removed {
            debug!(?handle, count = self.avatar_sources.len(), "unregistered avatar source");
        }
        removed
    }

    /// Replace the snapshot with `defaults` merged with `patch`, then push it
    /// to every registered source.
    ///
    /// A preference change still pending from the store is handled first.
    pub fn update_settings<S: AudioSourceSink<H>>(&mut self, patch: &AudioSettingsPatch, sink: &mut S) {
        self.poll_preferences(sink);
        self.replace_settings(patch, sink);
    }

    /// Restore the default snapshot on every source.
    pub fn reset_to_defaults<S: AudioSourceSink<H>>(&mut self, sink: &mut S) {
        let defaults = AudioSettingsPatch::from(&self.defaults);
        self.update_settings(&defaults, sink);
    }

    /// React to a change in the global preferences.
    ///
    /// The global distance model always overwrites both distance-model fields
    /// of the snapshot. A broadcast only happens if the output mode, the global
    /// rolloff factor or the global distance model moved since the last call.
    /// Returns whether a broadcast happened.
    pub fn on_preferences_changed<S: AudioSourceSink<H>>(&mut self, sink: &mut S) -> bool {
        self.preferences_dirty.store(false, Ordering::Release);
        let current = self.preferences.get();

        let changed = self.audio_output_mode != current.audio_output_mode
            || self.global_rolloff_factor != current.global_rolloff_factor
            || self.global_distance_model != current.global_distance_model;

        self.audio_output_mode = current.audio_output_mode;
        self.global_rolloff_factor = current.global_rolloff_factor;
        self.global_distance_model = current.global_distance_model;
        self.settings.set_distance_model(current.global_distance_model);

        if changed {
            debug!(
                output_mode = %current.audio_output_mode,
                global_rolloff_factor = current.global_rolloff_factor,
                global_distance_model = %current.global_distance_model,
                "audio preferences changed"
            );
            let snapshot = AudioSettingsPatch::from(&self.settings);
            self.replace_settings(&snapshot, sink);
        }
        changed
    }

    /// Run [`Self::on_preferences_changed`] if the store reported a change
    /// since the last call. Returns whether a broadcast happened.
    pub fn poll_preferences<S: AudioSourceSink<H>>(&mut self, sink: &mut S) -> bool {
        if self.preferences_dirty.load(Ordering::Acquire) {
            self.on_preferences_changed(sink)
        } else {
            false
        }
    }

    /// Write `patch` to the preference store and handle the change right away.
    pub fn update_preferences<S: AudioSourceSink<H>>(
        &mut self,
        patch: &PreferencesPatch,
        sink: &mut S,
    ) -> bool {
        self.preferences.update(patch);
        self.poll_preferences(sink)
    }

    /// Pretty-printed JSON of the current snapshot, for diagnostics.
    pub fn to_log(&self) -> String {
        serde_json::to_string_pretty(&self.settings)
            .unwrap_or_else(|err| format!("<unserializable audio settings: {err}>"))
    }

    fn replace_settings<S: AudioSourceSink<H>>(&mut self, patch: &AudioSettingsPatch, sink: &mut S) {
        self.settings = patch.merge_over(&self.defaults);
        self.broadcast(sink);
    }

    fn media_params(&self) -> MediaAudioParams {
        MediaAudioParams::from_settings(&self.settings, self.global_rolloff_factor)
    }

    fn avatar_params(&self) -> AvatarAudioParams {
        let positional = self.preferences.get().audio_output_mode.is_positional();
        AvatarAudioParams::from_settings(&self.settings, positional, self.global_rolloff_factor)
    }

    fn broadcast<S: AudioSourceSink<H>>(&self, sink: &mut S) {
        debug!(
            media = self.media_sources.len(),
            avatars = self.avatar_sources.len(),
            "broadcasting audio settings"
        );

        let media = self.media_params();
        for &handle in &self.media_sources {
            sink.apply_media_settings(handle, &media);
        }

        let avatar = self.avatar_params();
        for &handle in &self.avatar_sources {
            sink.apply_avatar_settings(handle, &avatar);
        }
    }
}

impl<H, P: PreferenceSource> Drop for AudioSettingsSystem<H, P> {
    fn drop(&mut self) {
        self.preferences.unsubscribe(self.listener);
    }
}

impl<H: fmt::Debug, P: PreferenceSource> fmt::Debug for AudioSettingsSystem<H, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSettingsSystem")
            .field("settings", &self.settings)
            .field("media_sources", &self.media_sources)
            .field("avatar_sources", &self.avatar_sources)
            .field("audio_output_mode", &self.audio_output_mode)
            .field("global_rolloff_factor", &self.global_rolloff_factor)
            .field("global_distance_model", &self.global_distance_model)
            .finish()
    }
}

fn remove_handle<H: PartialEq>(handles: &mut Vec<H>, handle: H) -> bool {
    match handles.iter().position(|existing| *existing == handle) {
        Some(index) => {
            handles.remove(index);
            true
        }
        None => false,
    }
}
