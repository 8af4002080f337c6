#![warn(missing_docs)]
//! ECS integration wrapping `bevy_ecs`: a frame schedule plus the components,
//! events and system that keep scene audio sources in sync with the audio
//! settings.

mod audio;

use bevy_ecs::schedule::{Schedule, ScheduleLabel, Schedules};
use bevy_ecs::world::World;

pub use audio::{
    install_audio_settings, sync_audio_settings, AudioSettingsResource, AvatarAudio,
    AvatarAudioSource, AvatarReady, MediaAudio, MediaReady, SceneAudioSettings, SceneReset,
    SourceDisposed, UseAudioSystemSettings, WorldSink,
};

/// Label for the default per-frame schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ScheduleLabel)]
pub struct DefaultFrameSchedule;

/// Build the baseline frame schedule.
pub fn build_default_schedule() -> Schedules {
    let mut schedules = Schedules::default();
    let mut schedule = Schedule::new(DefaultFrameSchedule);
    schedule.set_apply_final_deferred(true);
    schedules.insert(schedule);
    schedules
}

/// Run the default schedule for one frame, then clear change trackers so
/// removal notifications are seen once.
pub fn run_frame(world: &mut World, schedules: &mut Schedules, frame: u64) {
    tracing::trace!(frame, "running frame schedule");
    if let Some(schedule) = schedules.get_mut(DefaultFrameSchedule) {
        schedule.run(world);
    }
    world.clear_trackers();
}
