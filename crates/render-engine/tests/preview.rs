//! Preview driver: clock, rate limiting, cut skipping and the tokio loop.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reframe_render_engine::{run_preview, CancelFlag, PreviewDriver};

use common::{cut, plain_scene, renderer, sources};

const MS: u64 = 1_000_000;

fn driver(duration: f64, cuts: Vec<reframe_project_model::CutRegion>) -> PreviewDriver {
    let seeks = Arc::new(Mutex::new(Vec::new()));
    PreviewDriver::new(renderer(cuts), sources(duration, &seeks), 60)
}

#[test]
fn test_paused_driver_does_not_render_on_tick() {
    let mut driver = driver(5.0, vec![]);
    assert!(!driver.is_playing());
    assert!(!driver.tick(0).unwrap());
    assert!(!driver.tick(500 * MS).unwrap());
}

#[test]
fn test_ticks_follow_the_clock_and_rate_limit() {
    let mut driver = driver(5.0, vec![]);
    driver.play(0);

    assert!(driver.tick(0).unwrap());
    assert_eq!(driver.position(), 0.0);

    // Inside the 60 Hz interval.
    assert!(!driver.tick(MS).unwrap());

    assert!(driver.tick(100 * MS).unwrap());
    assert!((driver.position() - 0.1).abs() < 1e-9);
}

#[test]
fn test_playback_jumps_over_cuts() {
    let mut driver = driver(5.0, vec![cut(1, 1.0, 1.0)]);
    driver.play(0);

    assert!(driver.tick(1_500 * MS).unwrap());
    assert_eq!(driver.position(), 2.0);

    // The clock continues from the end of the cut.
    assert!(driver.tick(1_600 * MS).unwrap());
    assert!((driver.position() - 2.1).abs() < 1e-9);
}

#[test]
fn test_playback_pauses_at_the_end() {
    let mut driver = driver(1.0, vec![]);
    driver.play(0);
    assert!(driver.tick(2_000 * MS).unwrap());
    assert_eq!(driver.position(), 1.0);
    assert!(!driver.is_playing());

    // Playing again restarts from the top.
    driver.play(3_000 * MS);
    assert!(driver.tick(3_000 * MS).unwrap());
    assert_eq!(driver.position(), 0.0);
}

#[test]
fn test_seek_clamps_and_snaps_past_cuts() {
    let mut driver = driver(5.0, vec![cut(1, 1.0, 1.0), cut(2, 2.0, 0.5)]);

    assert_eq!(driver.seek(1.2).unwrap(), 2.5);
    assert_eq!(driver.seek(-3.0).unwrap(), 0.0);
    assert_eq!(driver.seek(99.0).unwrap(), 5.0);
    assert_eq!(driver.seek(f64::NAN).unwrap(), 0.0);
}

#[test]
fn test_seek_while_paused_renders_immediately() {
    let mut driver = driver(5.0, vec![]);
    let before = driver.surface().data().to_vec();
    driver.seek(3.0).unwrap();
    assert_ne!(driver.surface().data(), &before[..]);
}

#[test]
fn test_scene_change_redraws_current_frame() {
    let mut driver = driver(5.0, vec![]);
    driver.seek(1.0).unwrap();
    let before = driver.surface().data().to_vec();

    let mut scene = plain_scene(vec![]);
    scene.frame.padding = 25.0;
    driver.set_scene(scene).unwrap();

    assert_eq!(driver.position(), 1.0);
    assert_ne!(driver.surface().data(), &before[..]);
}

#[tokio::test]
async fn test_preview_loop_runs_until_stopped() {
    let mut driver = driver(0.2, vec![cut(1, 0.05, 0.05)]);
    driver.play(0);

    let stop = CancelFlag::new();
    let stopper = stop.clone();
    let mut positions = Vec::new();
    let presented = tokio::time::timeout(
        Duration::from_secs(10),
        run_preview(&mut driver, &stop, |surface, t| {
            assert_eq!(surface.width(), common::OUTPUT);
            positions.push(t);
            if t >= 0.2 {
                stopper.cancel();
            }
        }),
    )
    .await
    .expect("preview loop did not stop")
    .unwrap();

    assert_eq!(presented, positions.len() as u64);
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    assert!(positions.iter().all(|t| !(0.05..0.1).contains(t)));
    assert_eq!(*positions.last().unwrap(), 0.2);
    assert!(!driver.is_playing());
}
