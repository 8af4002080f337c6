#![warn(missing_docs)]
//! Test surfaces for audio settings propagation: a sink that records every
//! payload it receives, and a JSONL writer for payload logs.

use anyhow::Result;
use scenesound_audio::{AudioSourceSink, AvatarAudioParams, MediaAudioParams};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// One payload delivered to a source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedSettings<H> {
    /// Media settings applied to `handle`.
    Media {
        /// Receiving source.
        handle: H,
        /// Delivered payload.
        params: MediaAudioParams,
    },
    /// Avatar settings applied to `handle`.
    Avatar {
        /// Receiving source.
        handle: H,
        /// Delivered payload.
        params: AvatarAudioParams,
    },
}

impl<H: Copy> AppliedSettings<H> {
    /// The receiving source.
    pub fn handle(&self) -> H {
        match self {
            AppliedSettings::Media { handle, .. } | AppliedSettings::Avatar { handle, .. } => {
                *handle
            }
        }
    }
}

/// A sink that keeps every payload in delivery order.
#[derive(Debug, Clone)]
pub struct RecordingSink<H> {
    applied: Vec<AppliedSettings<H>>,
}

impl<H> Default for RecordingSink<H> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
        }
    }
}

impl<H: Copy + PartialEq> RecordingSink<H> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn applied(&self) -> &[AppliedSettings<H>] {
        &self.applied
    }

    /// Number of payloads delivered to `handle`, of either kind.
    pub fn count_for(&self, handle: H) -> usize {
        self.applied
            .iter()
            .filter(|entry| entry.handle() == handle)
            .count()
    }

    /// Media payloads delivered to `handle`, oldest first.
    pub fn media_for(&self, handle: H) -> Vec<MediaAudioParams> {
        self.applied
            .iter()
            .filter_map(|entry| match entry {
                AppliedSettings::Media { handle: h, params } if *h == handle => Some(*params),
                _ => None,
            })
            .collect()
    }

    /// Avatar payloads delivered to `handle`, oldest first.
    pub fn avatar_for(&self, handle: H) -> Vec<AvatarAudioParams> {
        self.applied
            .iter()
            .filter_map(|entry| match entry {
                AppliedSettings::Avatar { handle: h, params } if *h == handle => Some(*params),
                _ => None,
            })
            .collect()
    }

    /// Latest media payload for `handle`.
    pub fn last_media(&self, handle: H) -> Option<MediaAudioParams> {
        self.media_for(handle).last().copied()
    }

    /// Latest avatar payload for `handle`.
    pub fn last_avatar(&self, handle: H) -> Option<AvatarAudioParams> {
        self.avatar_for(handle).last().copied()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.applied.clear();
    }
}

impl<H> AudioSourceSink<H> for RecordingSink<H> {
    fn apply_media_settings(&mut self, handle: H, params: &MediaAudioParams) {
        self.applied.push(AppliedSettings::Media {
            handle,
            params: *params,
        });
    }

    fn apply_avatar_settings(&mut self, handle: H, params: &AvatarAudioParams) {
        self.applied.push(AppliedSettings::Avatar {
            handle,
            params: *params,
        });
    }
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append one record to the log.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }

    /// Append every record from a recorder.
    pub fn write_all<H: Serialize>(&mut self, records: &[AppliedSettings<H>]) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        tracing::debug!(records = records.len(), "wrote payload log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenesound_audio::AudioSettings;
    use scenesound_core::SourceId;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn recorder_filters_by_handle_and_kind() {
        let settings = AudioSettings::default();
        let mut sink = RecordingSink::new();
        sink.apply_media_settings(SourceId(1), &MediaAudioParams::from_settings(&settings, 1.0));
        sink.apply_avatar_settings(
            SourceId(2),
            &AvatarAudioParams::from_settings(&settings, true, 1.0),
        );

        assert_eq!(sink.count_for(SourceId(1)), 1);
        assert_eq!(sink.media_for(SourceId(2)).len(), 0);
        assert_eq!(sink.last_avatar(SourceId(2)).map(|p| p.positional), Some(true));

        sink.clear();
        assert!(sink.applied().is_empty());
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_payload() {
        let path = std::env::temp_dir().join(format!(
            "scenesound-payloads-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let settings = AudioSettings::default();
        let mut recorder = RecordingSink::new();
        recorder.apply_media_settings(SourceId(9), &MediaAudioParams::from_settings(&settings, 2.0));
        recorder.apply_media_settings(SourceId(9), &MediaAudioParams::from_settings(&settings, 1.0));

        let mut sink = JsonlSink::create(&path).expect("can create log");
        sink.write_all(recorder.applied()).expect("can write log");
        drop(sink);

        let contents = fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"kind\":\"media\""));
        assert!(contents.contains("\"rolloff_factor\":2.0"));
    }
}
