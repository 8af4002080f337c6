//! Headless scene: a world with a handful of audio sources driven frame by frame.

use bevy_ecs::entity::Entity;
use bevy_ecs::schedule::Schedules;
use bevy_ecs::world::World;
use scenesound_audio::{
    AudioSettingsSystem, AvatarAudioParams, MediaAudioParams, PreferenceSource, PreferencesPatch,
    SharedPreferenceStore,
};
use scenesound_ecs::{
    build_default_schedule, install_audio_settings, run_frame, AudioSettingsResource, AvatarAudio,
    AvatarAudioSource, AvatarReady, MediaAudio, MediaReady, SceneAudioSettings,
    UseAudioSystemSettings,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AudioConfig;

/// Final payload held by one entity, for logs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRecord {
    Media {
        entity: u64,
        params: MediaAudioParams,
    },
    Avatar {
        entity: u64,
        params: AvatarAudioParams,
    },
}

pub struct HeadlessScene {
    world: World,
    schedules: Schedules,
    preferences: SharedPreferenceStore,
    media: Vec<Entity>,
    avatars: Vec<Entity>,
    frame: u64,
}

impl HeadlessScene {
    pub fn new(config: &AudioConfig) -> Self {
        let mut world = World::default();
        let mut schedules = build_default_schedule();
        let preferences = SharedPreferenceStore::new(config.preferences.clone());
        install_audio_settings(
            &mut world,
            &mut schedules,
            AudioSettingsSystem::new(preferences.clone()),
        );

        let media: Vec<Entity> = (0..config.media_sources)
            .map(|_| world.spawn(UseAudioSystemSettings).id())
            .collect();
        let avatars: Vec<Entity> = (0..config.avatar_sources)
            .map(|_| world.spawn(AvatarAudioSource).id())
            .collect();

        if !config.scene.is_empty() {
            world.send_event(SceneAudioSettings(config.scene.clone()));
        }
        for &entity in &media {
            world.send_event(MediaReady(entity));
        }
        for &entity in &avatars {
            world.send_event(AvatarReady(entity));
        }

        info!(
            media = media.len(),
            avatars = avatars.len(),
            "headless scene ready"
        );

        Self {
            world,
            schedules,
            preferences,
            media,
            avatars,
            frame: 0,
        }
    }

    /// Run one frame.
    pub fn step(&mut self) {
        run_frame(&mut self.world, &mut self.schedules, self.frame);
        self.frame += 1;
    }

    /// Write to the preference store the way a settings screen would. The
    /// change is picked up on the next frame.
    pub fn change_preferences(&mut self, patch: &PreferencesPatch) {
        debug!(frame = self.frame, "changing preferences: {:?}", patch);
        self.preferences.update(patch);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Diagnostic dump of the current settings snapshot.
    pub fn settings_log(&self) -> String {
        self.world.resource::<AudioSettingsResource>().0.to_log()
    }

    /// Payload currently held by every source entity.
    pub fn records(&self) -> Vec<SourceRecord> {
        let media = self.media.iter().filter_map(|&entity| {
            self.world
                .get::<MediaAudio>(entity)
                .map(|audio| SourceRecord::Media {
                    entity: entity.to_bits(),
                    params: audio.0,
                })
        });
        let avatars = self.avatars.iter().filter_map(|&entity| {
            self.world
                .get::<AvatarAudio>(entity)
                .map(|audio| SourceRecord::Avatar {
                    entity: entity.to_bits(),
                    params: audio.0,
                })
        });
        media.chain(avatars).collect()
    }
}
