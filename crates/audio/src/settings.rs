//! Audio settings snapshot and partial updates.

use crate::AudioError;
use scenesound_core::DistanceModel;
use serde::{Deserialize, Serialize};

/// The full set of audio settings in effect for a scene.
///
/// A snapshot is replaced wholesale on every update; see
/// [`AudioSettingsPatch::merge_over`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Distance model for avatar voices.
    pub avatar_distance_model: DistanceModel,
    /// Rolloff factor for avatar voices, before the global scale.
    pub avatar_rolloff_factor: f32,
    /// Distance at which avatar attenuation starts.
    pub avatar_ref_distance: f32,
    /// Distance past which avatar voices stop attenuating.
    pub avatar_max_distance: f32,
    /// Output volume for media sources (0.0 to 1.0).
    pub media_volume: f32,
    /// Distance model for media sources.
    pub media_distance_model: DistanceModel,
    /// Rolloff factor for media sources, before the global scale.
    pub media_rolloff_factor: f32,
    /// Distance at which media attenuation starts.
    pub media_ref_distance: f32,
    /// Distance past which media sources stop attenuating.
    pub media_max_distance: f32,
    /// Inner cone angle in degrees.
    pub media_cone_inner_angle: f32,
    /// Outer cone angle in degrees.
    pub media_cone_outer_angle: f32,
    /// Gain outside the outer cone.
    pub media_cone_outer_gain: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            avatar_distance_model: DistanceModel::Inverse,
            avatar_rolloff_factor: 2.0,
            avatar_ref_distance: 1.0,
            avatar_max_distance: 10_000.0,
            media_volume: 0.5,
            media_distance_model: DistanceModel::Inverse,
            media_rolloff_factor: 1.0,
            media_ref_distance: 1.0,
            media_max_distance: 10_000.0,
            media_cone_inner_angle: 360.0,
            media_cone_outer_angle: 0.0,
            media_cone_outer_gain: 0.0,
        }
    }
}

impl AudioSettings {
    /// Set both distance-model fields at once.
    pub fn set_distance_model(&mut self, model: DistanceModel) {
        self.avatar_distance_model = model;
        self.media_distance_model = model;
    }
}

/// A partial set of audio settings. Unset fields are taken from the base
/// snapshot when merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettingsPatch {
    /// See [`AudioSettings::avatar_distance_model`].
    pub avatar_distance_model: Option<DistanceModel>,
    /// See [`AudioSettings::avatar_rolloff_factor`].
    pub avatar_rolloff_factor: Option<f32>,
    /// See [`AudioSettings::avatar_ref_distance`].
    pub avatar_ref_distance: Option<f32>,
    /// See [`AudioSettings::avatar_max_distance`].
    pub avatar_max_distance: Option<f32>,
    /// See [`AudioSettings::media_volume`].
    pub media_volume: Option<f32>,
    /// See [`AudioSettings::media_distance_model`].
    pub media_distance_model: Option<DistanceModel>,
    /// See [`AudioSettings::media_rolloff_factor`].
    pub media_rolloff_factor: Option<f32>,
    /// See [`AudioSettings::media_ref_distance`].
    pub media_ref_distance: Option<f32>,
    /// See [`AudioSettings::media_max_distance`].
    pub media_max_distance: Option<f32>,
    /// See [`AudioSettings::media_cone_inner_angle`].
    pub media_cone_inner_angle: Option<f32>,
    /// See [`AudioSettings::media_cone_outer_angle`].
    pub media_cone_outer_angle: Option<f32>,
    /// See [`AudioSettings::media_cone_outer_gain`].
    pub media_cone_outer_gain: Option<f32>,
}

impl AudioSettingsPatch {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Decode a patch from JSON. Unknown fields are ignored.
    pub fn from_json(input: &str) -> Result<Self, AudioError> {
        serde_json::from_str(input).map_err(|source| AudioError::Decode {
            what: "audio settings patch",
            source,
        })
    }

    /// Build a brand-new snapshot: fields set here win, the rest come from `base`.
    pub fn merge_over(&self, base: &AudioSettings) -> AudioSettings {
        AudioSettings {
            avatar_distance_model: self
                .avatar_distance_model
                .unwrap_or(base.avatar_distance_model),
            avatar_rolloff_factor: self
                .avatar_rolloff_factor
                .unwrap_or(base.avatar_rolloff_factor),
            avatar_ref_distance: self.avatar_ref_distance.unwrap_or(base.avatar_ref_distance),
            avatar_max_distance: self.avatar_max_distance.unwrap_or(base.avatar_max_distance),
            media_volume: self.media_volume.unwrap_or(base.media_volume),
            media_distance_model: self
                .media_distance_model
                .unwrap_or(base.media_distance_model),
            media_rolloff_factor: self
                .media_rolloff_factor
                .unwrap_or(base.media_rolloff_factor),
            media_ref_distance: self.media_ref_distance.unwrap_or(base.media_ref_distance),
            media_max_distance: self.media_max_distance.unwrap_or(base.media_max_distance),
            media_cone_inner_angle: self
                .media_cone_inner_angle
                .unwrap_or(base.media_cone_inner_angle),
            media_cone_outer_angle: self
                .media_cone_outer_angle
                .unwrap_or(base.media_cone_outer_angle),
            media_cone_outer_gain: self
                .media_cone_outer_gain
                .unwrap_or(base.media_cone_outer_gain),
        }
    }
}

impl From<&AudioSettings> for AudioSettingsPatch {
    fn from(settings: &AudioSettings) -> Self {
        Self {
            avatar_distance_model: Some(settings.avatar_distance_model),
            avatar_rolloff_factor: Some(settings.avatar_rolloff_factor),
            avatar_ref_distance: Some(settings.avatar_ref_distance),
            avatar_max_distance: Some(settings.avatar_max_distance),
            media_volume: Some(settings.media_volume),
            media_distance_model: Some(settings.media_distance_model),
            media_rolloff_factor: Some(settings.media_rolloff_factor),
            media_ref_distance: Some(settings.media_ref_distance),
            media_max_distance: Some(settings.media_max_distance),
            media_cone_inner_angle: Some(settings.media_cone_inner_angle),
            media_cone_outer_angle: Some(settings.media_cone_outer_angle),
            media_cone_outer_gain: Some(settings.media_cone_outer_gain),
        }
    }
}

impl From<AudioSettings> for AudioSettingsPatch {
    fn from(settings: AudioSettings) -> Self {
        Self::from(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AudioSettings::default();
        assert_eq!(settings.avatar_distance_model, DistanceModel::Inverse);
        assert_eq!(settings.avatar_rolloff_factor, 2.0);
        assert_eq!(settings.media_rolloff_factor, 1.0);
        assert_eq!(settings.media_max_distance, 10_000.0);
        assert_eq!(settings.media_cone_inner_angle, 360.0);
        assert_eq!(settings.media_volume, 0.5);
    }

    #[test]
    fn test_empty_patch_keeps_base() {
        let base = AudioSettings::default();
        let patch = AudioSettingsPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.merge_over(&base), base);
    }

    #[test]
    fn test_patch_overrides_only_set_fields() {
        let base = AudioSettings::default();
        let patch = AudioSettingsPatch {
            media_rolloff_factor: Some(3.0),
            avatar_distance_model: Some(DistanceModel::Linear),
            ..Default::default()
        };

        let merged = patch.merge_over(&base);
        assert_eq!(merged.media_rolloff_factor, 3.0);
        assert_eq!(merged.avatar_distance_model, DistanceModel::Linear);
        assert_eq!(merged.media_distance_model, DistanceModel::Inverse);
        assert_eq!(merged.avatar_rolloff_factor, 2.0);
    }

    #[test]
    fn test_full_patch_reproduces_snapshot() {
        let mut custom = AudioSettings::default();
        custom.media_cone_outer_gain = 0.25;
        custom.set_distance_model(DistanceModel::Exponential);

        let patch = AudioSettingsPatch::from(&custom);
        assert_eq!(patch.merge_over(&AudioSettings::default()), custom);
    }

    #[test]
    fn test_patch_deserializes_partial_json() {
        let patch = AudioSettingsPatch::from_json(
            r#"{ "media_rolloff_factor": 3, "media_distance_model": "linear" }"#,
        )
        .unwrap();
        assert_eq!(patch.media_rolloff_factor, Some(3.0));
        assert_eq!(patch.media_distance_model, Some(DistanceModel::Linear));
        assert_eq!(patch.avatar_max_distance, None);
    }

    #[test]
    fn test_patch_rejects_bad_distance_model() {
        let err = AudioSettingsPatch::from_json(r#"{ "avatar_distance_model": "cubic" }"#)
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to decode audio settings patch"));
    }
}
