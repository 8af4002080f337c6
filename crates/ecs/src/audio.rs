//! Scene audio settings wired into the ECS.
//!
//! Entities opt in with [`UseAudioSystemSettings`] (media) or
//! [`AvatarAudioSource`] (avatar voices). Readiness and disposal arrive as
//! events; the resolved payloads land on the entity as [`MediaAudio`] and
//! [`AvatarAudio`] components.

use bevy_ecs::component::Component;
use bevy_ecs::entity::Entity;
use bevy_ecs::event::{Event, Events};
use bevy_ecs::schedule::Schedules;
use bevy_ecs::system::Resource;
use bevy_ecs::world::{Mut, World};
use scenesound_audio::{
    AudioSettingsPatch, AudioSettingsSystem, AudioSourceSink, AvatarAudioParams,
    MediaAudioParams, SharedPreferenceStore,
};
use tracing::debug;

use crate::DefaultFrameSchedule;

/// Marks a media entity whose audio follows the scene settings.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct UseAudioSystemSettings;

/// Marks an avatar voice entity whose audio follows the scene settings.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct AvatarAudioSource;

/// Media audio parameters as last applied by the settings system.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MediaAudio(pub MediaAudioParams);

/// Avatar audio parameters as last applied by the settings system.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct AvatarAudio(pub AvatarAudioParams);

/// A media entity finished loading (or reloaded) and can receive settings.
#[derive(Event, Debug, Clone, Copy)]
pub struct MediaReady(pub Entity);

/// An avatar voice entity is ready to receive settings.
#[derive(Event, Debug, Clone, Copy)]
pub struct AvatarReady(pub Entity);

/// An entity's audio source is going away.
#[derive(Event, Debug, Clone, Copy)]
pub struct SourceDisposed(pub Entity);

/// The scene was reset; audio settings go back to defaults.
#[derive(Event, Debug, Clone, Copy)]
pub struct SceneReset;

/// New audio settings for the scene, merged over the defaults.
#[derive(Event, Debug, Clone)]
pub struct SceneAudioSettings(pub AudioSettingsPatch);

/// The settings system, keyed by entity.
#[derive(Resource, Debug)]
pub struct AudioSettingsResource(pub AudioSettingsSystem<Entity, SharedPreferenceStore>);

/// Delivers payloads by inserting components on live entities.
pub struct WorldSink<'w> {
    world: &'w mut World,
}

impl<'w> WorldSink<'w> {
    /// Wrap a world.
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    /// The wrapped world.
    pub fn world(&self) -> &World {
        &*self.world
    }
}

impl AudioSourceSink<Entity> for WorldSink<'_> {
    fn apply_media_settings(&mut self, handle: Entity, params: &MediaAudioParams) {
        match self.world.get_entity_mut(handle) {
            Some(mut entity) => {
                entity.insert(MediaAudio(*params));
            }
            None => debug!(?handle, "skipping media settings for despawned entity"),
        }
    }

    fn apply_avatar_settings(&mut self, handle: Entity, params: &AvatarAudioParams) {
        match self.world.get_entity_mut(handle) {
            Some(mut entity) => {
                entity.insert(AvatarAudio(*params));
            }
            None => debug!(?handle, "skipping avatar settings for despawned entity"),
        }
    }
}

/// Insert the settings system and its events into `world`, and add
/// [`sync_audio_settings`] to the default frame schedule.
pub fn install_audio_settings(
    world: &mut World,
    schedules: &mut Schedules,
    system: AudioSettingsSystem<Entity, SharedPreferenceStore>,
) {
    world.insert_resource(AudioSettingsResource(system));
    world.init_resource::<Events<MediaReady>>();
    world.init_resource::<Events<AvatarReady>>();
    world.init_resource::<Events<SourceDisposed>>();
    world.init_resource::<Events<SceneReset>>();
    world.init_resource::<Events<SceneAudioSettings>>();

    if let Some(schedule) = schedules.get_mut(DefaultFrameSchedule) {
        schedule.add_systems(sync_audio_settings);
    } else {
        tracing::warn!("default frame schedule missing; audio settings will not sync");
    }
}

/// Apply this frame's audio events to the settings system.
///
/// Order within a frame: disposals and marker removals, preference changes,
/// scene reset, scene settings, then readiness. Readiness only registers
/// entities that still carry their marker component.
pub fn sync_audio_settings(world: &mut World) {
    let disposed = drain_events::<SourceDisposed>(world);
    let reset = !drain_events::<SceneReset>(world).is_empty();
    let updates = drain_events::<SceneAudioSettings>(world);
    let media_ready = drain_events::<MediaReady>(world);
    let avatar_ready = drain_events::<AvatarReady>(world);
    let removed_media: Vec<Entity> = world.removed::<UseAudioSystemSettings>().collect();
    let removed_avatars: Vec<Entity> = world.removed::<AvatarAudioSource>().collect();

    if !world.contains_resource::<AudioSettingsResource>() {
        return;
    }

    world.resource_scope(|world, mut audio: Mut<AudioSettingsResource>| {
        let audio = &mut audio.0;

        for SourceDisposed(entity) in disposed {
            audio.unregister_media(entity);
            audio.unregister_avatar(entity);
        }
        for entity in removed_media {
            audio.unregister_media(entity);
        }
        for entity in removed_avatars {
            audio.unregister_avatar(entity);
        }

        let mut sink = WorldSink::new(world);
        audio.poll_preferences(&mut sink);

        if reset {
            debug!("scene reset, restoring default audio settings");
            audio.reset_to_defaults(&mut sink);
        }
        for SceneAudioSettings(patch) in updates {
            audio.update_settings(&patch, &mut sink);
        }

        for MediaReady(entity) in media_ready {
            if sink.world().get::<UseAudioSystemSettings>(entity).is_none() {
                continue;
            }
            // A reload hands us the same entity again; start it over.
            audio.unregister_media(entity);
            audio.register_media(entity, &mut sink);
        }
        for AvatarReady(entity) in avatar_ready {
            if sink.world().get::<AvatarAudioSource>(entity).is_none() {
                continue;
            }
            audio.register_avatar(entity, &mut sink);
        }
    });
}

fn drain_events<E: Event>(world: &mut World) -> Vec<E> {
    world
        .get_resource_mut::<Events<E>>()
        .map(|mut events| events.drain().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_default_schedule, run_frame};
    use scenesound_audio::{PreferenceSource, Preferences, PreferencesPatch};
    use scenesound_core::DistanceModel;

    fn scene() -> (World, Schedules, SharedPreferenceStore) {
        let mut world = World::default();
        let mut schedules = build_default_schedule();
        let store = SharedPreferenceStore::new(Preferences::default());
        install_audio_settings(
            &mut world,
            &mut schedules,
            AudioSettingsSystem::new(store.clone()),
        );
        (world, schedules, store)
    }

    #[test]
    fn media_ready_inserts_component() {
        let (mut world, mut schedules, _) = scene();
        let video = world.spawn(UseAudioSystemSettings).id();
        world.send_event(MediaReady(video));

        run_frame(&mut world, &mut schedules, 0);

        let media = world.get::<MediaAudio>(video).expect("media settings applied");
        assert_eq!(media.0.rolloff_factor, 1.0);
        assert_eq!(media.0.cone_inner_angle, 360.0);
    }

    #[test]
    fn unmarked_entities_are_ignored() {
        let (mut world, mut schedules, _) = scene();
        let plain = world.spawn_empty().id();
        world.send_event(MediaReady(plain));
        world.send_event(AvatarReady(plain));

        run_frame(&mut world, &mut schedules, 0);

        assert!(world.get::<MediaAudio>(plain).is_none());
        assert!(world.get::<AvatarAudio>(plain).is_none());
        let audio = &world.resource::<AudioSettingsResource>().0;
        assert!(audio.media_sources().is_empty());
    }

    #[test]
    fn scene_settings_reach_registered_avatars() {
        let (mut world, mut schedules, _) = scene();
        let avatar = world.spawn(AvatarAudioSource).id();
        world.send_event(AvatarReady(avatar));
        run_frame(&mut world, &mut schedules, 0);

        world.send_event(SceneAudioSettings(AudioSettingsPatch {
            avatar_rolloff_factor: Some(5.0),
            ..Default::default()
        }));
        run_frame(&mut world, &mut schedules, 1);

        let avatar_audio = world.get::<AvatarAudio>(avatar).expect("avatar settings");
        assert_eq!(avatar_audio.0.rolloff_factor, 5.0);
        assert!(avatar_audio.0.positional);

        world.send_event(SceneReset);
        run_frame(&mut world, &mut schedules, 2);
        let avatar_audio = world.get::<AvatarAudio>(avatar).expect("avatar settings");
        assert_eq!(avatar_audio.0.rolloff_factor, 2.0);
    }

    #[test]
    fn disposed_and_despawned_sources_are_dropped() {
        let (mut world, mut schedules, _) = scene();
        let kept = world.spawn(UseAudioSystemSettings).id();
        let disposed = world.spawn(UseAudioSystemSettings).id();
        let despawned = world.spawn(UseAudioSystemSettings).id();
        for entity in [kept, disposed, despawned] {
            world.send_event(MediaReady(entity));
        }
        run_frame(&mut world, &mut schedules, 0);

        world.send_event(SourceDisposed(disposed));
        world.despawn(despawned);
        run_frame(&mut world, &mut schedules, 1);

        let audio = &world.resource::<AudioSettingsResource>().0;
        assert_eq!(audio.media_sources(), &[kept]);
    }

    #[test]
    fn preference_changes_propagate_on_next_frame() {
        let (mut world, mut schedules, mut store) = scene();
        let video = world.spawn(UseAudioSystemSettings).id();
        world.send_event(MediaReady(video));
        run_frame(&mut world, &mut schedules, 0);

        store.update(&PreferencesPatch {
            global_distance_model: Some(DistanceModel::Linear),
            global_rolloff_factor: Some(3.0),
            ..Default::default()
        });
        run_frame(&mut world, &mut schedules, 1);

        let media = world.get::<MediaAudio>(video).expect("media settings");
        assert_eq!(media.0.distance_model, DistanceModel::Linear);
        assert_eq!(media.0.rolloff_factor, 3.0);
    }

    #[test]
    fn sink_skips_despawned_entities() {
        let mut world = World::default();
        let gone = world.spawn_empty().id();
        world.despawn(gone);

        let params = MediaAudioParams::from_settings(&Default::default(), 1.0);
        let mut sink = WorldSink::new(&mut world);
        sink.apply_media_settings(gone, &params);
        assert!(sink.world().get::<MediaAudio>(gone).is_none());
    }
}
