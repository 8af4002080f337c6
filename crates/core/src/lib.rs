#![warn(missing_docs)]
//! Core vocabulary shared across the workspace.
//!
//! These types mirror the values a host scene runtime stores in its audio
//! preferences and hands to audio sources: how volume falls off with distance,
//! whether output is positional, and an opaque source identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown enum label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The label is not a known distance model.
    #[error("unknown distance model `{0}` (expected linear, inverse or exponential)")]
    DistanceModel(String),
    /// The label is not a known output mode.
    #[error("unknown audio output mode `{0}` (expected audio or panner)")]
    OutputMode(String),
}

/// Distance attenuation curve applied by an audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceModel {
    /// Linear falloff between ref and max distance.
    Linear,
    /// Inverse falloff (`ref / (ref + rolloff * (d - ref))`).
    #[default]
    Inverse,
    /// Exponential falloff.
    Exponential,
}

impl DistanceModel {
    /// Label used by the host runtime.
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceModel::Linear => "linear",
            DistanceModel::Inverse => "inverse",
            DistanceModel::Exponential => "exponential",
        }
    }
}

impl fmt::Display for DistanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceModel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(DistanceModel::Linear),
            "inverse" => Ok(DistanceModel::Inverse),
            "exponential" => Ok(DistanceModel::Exponential),
            other => Err(ParseError::DistanceModel(other.to_string())),
        }
    }
}

/// How avatar audio is rendered by the host.
///
/// `Audio` is plain stereo output, `Panner` is spatialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutputMode {
    /// Non-positional stereo output.
    Audio,
    /// Positional (panned) output.
    #[default]
    Panner,
}

impl AudioOutputMode {
    /// Whether sources should be spatialized in this mode.
    pub fn is_positional(self) -> bool {
        self != AudioOutputMode::Audio
    }

    /// Label used by the host runtime.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioOutputMode::Audio => "audio",
            AudioOutputMode::Panner => "panner",
        }
    }
}

impl fmt::Display for AudioOutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioOutputMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(AudioOutputMode::Audio),
            "panner" => Ok(AudioOutputMode::Panner),
            other => Err(ParseError::OutputMode(other.to_string())),
        }
    }
}

/// Opaque identifier for an audio-emitting source owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_model_parses_host_labels() {
        assert_eq!("inverse".parse::<DistanceModel>(), Ok(DistanceModel::Inverse));
        assert_eq!(" Linear ".parse::<DistanceModel>(), Ok(DistanceModel::Linear));
        assert_eq!("exponential".parse::<DistanceModel>(), Ok(DistanceModel::Exponential));
        assert_eq!(
            "log".parse::<DistanceModel>(),
            Err(ParseError::DistanceModel("log".to_string()))
        );
    }

    #[test]
    fn distance_model_serializes_lowercase() {
        let json = serde_json::to_string(&DistanceModel::Exponential).unwrap();
        assert_eq!(json, "\"exponential\"");
        let back: DistanceModel = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(back, DistanceModel::Linear);
    }

    #[test]
    fn only_audio_mode_is_non_positional() {
        assert!(!AudioOutputMode::Audio.is_positional());
        assert!(AudioOutputMode::Panner.is_positional());
        assert_eq!(AudioOutputMode::default(), AudioOutputMode::Panner);
    }

    #[test]
    fn output_mode_round_trips_through_display() {
        for mode in [AudioOutputMode::Audio, AudioOutputMode::Panner] {
            assert_eq!(mode.to_string().parse::<AudioOutputMode>(), Ok(mode));
        }
        assert!("stereo".parse::<AudioOutputMode>().is_err());
    }

    #[test]
    fn source_id_displays_with_prefix() {
        assert_eq!(SourceId(7).to_string(), "source#7");
    }
}
