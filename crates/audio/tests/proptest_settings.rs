//! Property tests for snapshot merging and broadcast bookkeeping.

use proptest::prelude::*;
use scenesound_audio::{AudioSettings, AudioSettingsPatch, AudioSettingsSystem, PreferenceStore};
use scenesound_core::{DistanceModel, SourceId};
use scenesound_testkit::RecordingSink;

fn distance_model() -> impl Strategy<Value = DistanceModel> {
    prop_oneof![
        Just(DistanceModel::Linear),
        Just(DistanceModel::Inverse),
        Just(DistanceModel::Exponential),
    ]
}

fn patch() -> impl Strategy<Value = AudioSettingsPatch> {
    (
        proptest::option::of(distance_model()),
        proptest::option::of(0.0f32..10.0),
        proptest::option::of(0.0f32..100.0),
        proptest::option::of(0.0f32..1.0),
        proptest::option::of(0.0f32..360.0),
    )
        .prop_map(|(model, rolloff, max, gain, angle)| AudioSettingsPatch {
            media_distance_model: model,
            avatar_rolloff_factor: rolloff,
            media_max_distance: max,
            media_cone_outer_gain: gain,
            media_cone_inner_angle: angle,
            ..Default::default()
        })
}

proptest! {
    /// Property: a second update never inherits fields from the first.
    #[test]
    fn updates_merge_over_defaults_only(first in patch(), second in patch()) {
        let mut system = AudioSettingsSystem::new(PreferenceStore::default());
        let mut sink: RecordingSink<SourceId> = RecordingSink::new();
        system.update_settings(&first, &mut sink);
        system.update_settings(&second, &mut sink);

        prop_assert_eq!(system.settings(), &second.merge_over(&AudioSettings::default()));
    }

    /// Property: membership stays unique whatever the register/unregister order.
    #[test]
    fn membership_stays_unique(ops in prop::collection::vec((any::<bool>(), 0u64..5), 0..50)) {
        let mut system = AudioSettingsSystem::new(PreferenceStore::default());
        let mut sink = RecordingSink::new();
        for (register, id) in ops {
            if register {
                system.register_avatar(SourceId(id), &mut sink);
            } else {
                system.unregister_avatar(SourceId(id));
            }
        }

        let sources = system.avatar_sources();
        for (i, a) in sources.iter().enumerate() {
            prop_assert!(!sources[i + 1..].contains(a));
        }
    }

    /// Property: after a broadcast every registered source holds the current snapshot.
    #[test]
    fn broadcast_reaches_every_source(ids in prop::collection::vec(0u64..20, 1..10), update in patch()) {
        let mut system = AudioSettingsSystem::new(PreferenceStore::default());
        let mut sink = RecordingSink::new();
        for id in &ids {
            system.register_media(SourceId(*id), &mut sink);
        }
        system.update_settings(&update, &mut sink);

        let expected = update.merge_over(&AudioSettings::default());
        for id in ids {
            let params = sink.last_media(SourceId(id));
            prop_assert_eq!(params.map(|p| p.max_distance), Some(expected.media_max_distance));
            prop_assert_eq!(params.map(|p| p.distance_model), Some(expected.media_distance_model));
        }
    }
}
