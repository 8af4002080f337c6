//! Per-source payloads and the sink that receives them.

use crate::AudioSettings;
use scenesound_core::DistanceModel;
use serde::{Deserialize, Serialize};

/// Settings pushed onto a media (video/audio clip) source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaAudioParams {
    /// Distance attenuation curve.
    pub distance_model: DistanceModel,
    /// Rolloff already multiplied by the global rolloff factor.
    pub rolloff_factor: f32,
    /// Reference distance.
    pub ref_distance: f32,
    /// Maximum distance.
    pub max_distance: f32,
    /// Inner cone angle in degrees.
    pub cone_inner_angle: f32,
    /// Outer cone angle in degrees.
    pub cone_outer_angle: f32,
    /// Gain outside the outer cone.
    pub cone_outer_gain: f32,
}

impl MediaAudioParams {
    /// Derive the media payload from a snapshot.
    pub fn from_settings(settings: &AudioSettings, global_rolloff_factor: f32) -> Self {
        Self {
            distance_model: settings.media_distance_model,
            rolloff_factor: settings.media_rolloff_factor * global_rolloff_factor,
            ref_distance: settings.media_ref_distance,
            max_distance: settings.media_max_distance,
            cone_inner_angle: settings.media_cone_inner_angle,
            cone_outer_angle: settings.media_cone_outer_angle,
            cone_outer_gain: settings.media_cone_outer_gain,
        }
    }
}

/// Settings pushed onto an avatar voice source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvatarAudioParams {
    /// Whether the voice is spatialized.
    pub positional: bool,
    /// Distance attenuation curve.
    pub distance_model: DistanceModel,
    /// Maximum distance.
    pub max_distance: f32,
    /// Reference distance.
    pub ref_distance: f32,
    /// Rolloff already multiplied by the global rolloff factor.
    pub rolloff_factor: f32,
}

impl AvatarAudioParams {
    /// Derive the avatar payload from a snapshot.
    pub fn from_settings(
        settings: &AudioSettings,
        positional: bool,
        global_rolloff_factor: f32,
    ) -> Self {
        Self {
            positional,
            distance_model: settings.avatar_distance_model,
            max_distance: settings.avatar_max_distance,
            ref_distance: settings.avatar_ref_distance,
            rolloff_factor: settings.avatar_rolloff_factor * global_rolloff_factor,
        }
    }
}

/// Receives payloads for registered sources.
///
/// The registry never owns the sources behind `H`; it only hands the sink the
/// handle and the payload to apply. A sink is borrowed for the duration of a
/// single registry call, so it cannot call back into the registry mid-broadcast.
pub trait AudioSourceSink<H> {
    /// Apply media settings to `handle`.
    fn apply_media_settings(&mut self, handle: H, params: &MediaAudioParams);

    /// Apply avatar settings to `handle`.
    fn apply_avatar_settings(&mut self, handle: H, params: &AvatarAudioParams);
}

impl<H, S: AudioSourceSink<H> + ?Sized> AudioSourceSink<H> for &mut S {
    fn apply_media_settings(&mut self, handle: H, params: &MediaAudioParams) {
        (**self).apply_media_settings(handle, params);
    }

    fn apply_avatar_settings(&mut self, handle: H, params: &AvatarAudioParams) {
        (**self).apply_avatar_settings(handle, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_params_scale_rolloff() {
        let settings = AudioSettings {
            media_rolloff_factor: 3.0,
            ..Default::default()
        };
        let params = MediaAudioParams::from_settings(&settings, 2.0);
        assert_eq!(params.rolloff_factor, 6.0);
        assert_eq!(params.distance_model, DistanceModel::Inverse);
        assert_eq!(params.cone_inner_angle, 360.0);
        assert_eq!(params.max_distance, 10_000.0);
    }

    #[test]
    fn avatar_params_carry_positional_flag() {
        let settings = AudioSettings::default();
        let params = AvatarAudioParams::from_settings(&settings, false, 1.0);
        assert!(!params.positional);
        assert_eq!(params.rolloff_factor, 2.0);
        assert_eq!(params.ref_distance, 1.0);
    }
}
