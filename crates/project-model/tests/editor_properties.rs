use proptest::prelude::*;

use reframe_project_model::{
    MouseTrack, RecordingGeometry, RegionEditor, RegionPatch, TimelineSpan, Z_INDEX_BASE,
};

fn editor(duration: f64) -> RegionEditor {
    let mut editor = RegionEditor::default();
    editor.set_video_duration(duration);
    editor
}

#[test]
fn z_index_follows_duration_across_both_kinds() {
    let mut editor = editor(100.0);
    let five = editor
        .add_cut_region(RegionPatch::default().with_start(0.0).with_duration(5.0))
        .unwrap()
        .unwrap();
    editor.set_playhead(20.0);
    let one = editor
        .add_zoom_region(&MouseTrack::default(), &RecordingGeometry::new(0.0, 0.0, 10.0, 10.0))
        .unwrap();
    editor
        .update_region(one, &RegionPatch::default().with_duration(1.0))
        .unwrap();
    let three = editor
        .add_cut_region(RegionPatch::default().with_start(40.0).with_duration(3.0))
        .unwrap()
        .unwrap();

    let timeline = editor.timeline();
    let z_one = timeline.zoom_region(one).unwrap().z_index;
    let z_three = timeline.cut_region(three).unwrap().z_index;
    let z_five = timeline.cut_region(five).unwrap().z_index;
    assert_eq!(z_one, Z_INDEX_BASE);
    assert!(z_one > z_three && z_three > z_five);
}

#[test]
fn timeline_survives_a_save_cycle() {
    let mut editor = editor(60.0);
    editor.set_playhead(5.0);
    editor
        .add_zoom_region(&MouseTrack::default(), &RecordingGeometry::new(0.0, 0.0, 10.0, 10.0))
        .unwrap();
    editor.trim_end().unwrap();

    let timeline = editor.into_timeline();
    let json = serde_json::to_string(&timeline).unwrap();
    let reloaded = reframe_project_model::Timeline::from_json(&json).unwrap();
    assert_eq!(reloaded, timeline);
}

proptest! {
    #[test]
    fn prop_shorter_regions_have_higher_z_index(
        durations in prop::collection::vec(0.1f64..30.0, 1..12)
    ) {
        let mut editor = editor(10_000.0);
        let mut ids = vec![];
        for (i, duration) in durations.iter().enumerate() {
            let id = editor
                .add_cut_region(
                    RegionPatch::default()
                        .with_start(i as f64 * 40.0)
                        .with_duration(*duration),
                )
                .unwrap()
                .unwrap();
            ids.push(id);
        }

        let timeline = editor.timeline();
        for a in &ids {
            for b in &ids {
                let ra = timeline.cut_region(*a).unwrap();
                let rb = timeline.cut_region(*b).unwrap();
                if ra.duration() < rb.duration() {
                    prop_assert!(ra.z_index > rb.z_index);
                }
            }
        }
    }

    #[test]
    fn prop_set_video_duration_keeps_regions_inside(
        starts in prop::collection::vec(0.0f64..50.0, 1..8),
        new_duration in 1.0f64..60.0,
    ) {
        let mut editor = editor(100.0);
        for start in &starts {
            editor
                .add_cut_region(RegionPatch::default().with_start(*start))
                .unwrap();
        }
        editor.set_video_duration(new_duration);

        for cut in editor.timeline().cut_regions() {
            prop_assert!(cut.start_time >= 0.0);
            prop_assert!(cut.start_time < new_duration);
            prop_assert!(cut.end_time() <= new_duration + 1e-9);
            prop_assert!(cut.duration > 0.0);
        }
    }
}
