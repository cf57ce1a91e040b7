use super::keyboard::events_for_key;
use super::runtime::SnapTracker;
use super::*;
use crate::camera::{MockCameraControl, MockCameraProvider};
use crate::config::CampreviewConfig;
use crate::events::{EventBus, PreviewEvent};
use crate::orientation::{CameraFacing, CameraInfo, DeviceRotation};
use crate::preview::PreviewState;
use crossterm::event::KeyCode;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

fn create_test_config(pictures: &Path) -> CampreviewConfig {
    let mut config = CampreviewConfig::default();
    config.capture.pictures_dir = Some(pictures.display().to_string());
    config.capture.timestamp_timezone = "UTC".to_string();
    config.display.surface_sink = "fakesink".to_string();
    config
}

fn create_test_activity(config: CampreviewConfig) -> (CameraActivity, MockCameraControl, EventBus) {
    let provider = Arc::new(MockCameraProvider::new(
        CameraInfo::new(config.camera.facing, config.camera.mount_angle),
        config.camera.resolution,
    ));
    let control = provider.control();
    let events = EventBus::new(64);
    (
        CameraActivity::new(config, provider, events.clone()),
        control,
        events,
    )
}

fn start(activity: &mut CameraActivity, config: &CampreviewConfig) {
    for event in startup_sequence(config) {
        assert_eq!(activity.handle(event), ControlFlow::Continue(()));
    }
}

#[test]
fn test_startup_sequence_runs_preview() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let (mut activity, control, _events) = create_test_activity(config.clone());

    start(&mut activity, &config);

    assert!(activity.is_preview_shown());
    let preview = activity.preview().unwrap();
    assert_eq!(preview.state(), PreviewState::PreviewRunning);
    assert_eq!(control.open_count(), 1);
    assert!(control.is_previewing());
}

#[test]
fn test_pause_releases_and_resume_restores() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let (mut activity, control, _events) = create_test_activity(config.clone());
    start(&mut activity, &config);

    activity.handle(LifecycleEvent::Pause);
    assert!(!activity.is_preview_shown());
    assert!(!control.is_held());
    assert_eq!(activity.preview().unwrap().state(), PreviewState::Idle);

    // Pausing again must not double-release
    activity.handle(LifecycleEvent::Pause);
    assert_eq!(control.release_count(), 1);

    activity.handle(LifecycleEvent::Resume);
    assert_eq!(
        activity.preview().unwrap().state(),
        PreviewState::PreviewRunning
    );
    assert_eq!(control.open_count(), 2);
}

#[test]
fn test_shutter_counts_pictures() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let (mut activity, control, _events) = create_test_activity(config.clone());
    start(&mut activity, &config);

    activity.handle(LifecycleEvent::Shutter);
    assert_eq!(activity.stats().pictures_saved, 1);

    control.fail_take_picture(true);
    activity.handle(LifecycleEvent::Shutter);
    assert_eq!(activity.stats().captures_failed, 1);
    assert_eq!(
        activity.preview().unwrap().state(),
        PreviewState::PreviewRunning
    );
}

#[test]
fn test_shutter_with_capture_disabled_is_not_a_failure() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = create_test_config(temp.path());
    config.capture.enabled = false;
    let (mut activity, control, _events) = create_test_activity(config.clone());
    start(&mut activity, &config);

    activity.handle(LifecycleEvent::Shutter);
    assert_eq!(activity.stats().pictures_saved, 0);
    assert_eq!(activity.stats().captures_failed, 0);
    assert_eq!(control.pictures_taken(), 0);
}

#[test]
fn test_rotate_clockwise_updates_orientation() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let (mut activity, control, _events) = create_test_activity(config.clone());
    start(&mut activity, &config);
    assert_eq!(control.display_orientation(), Some(90));

    activity.handle(LifecycleEvent::RotateClockwise);
    assert_eq!(
        activity.preview().unwrap().display_rotation(),
        DeviceRotation::Rotation90
    );
    assert_eq!(control.display_orientation(), Some(0));

    activity.handle(LifecycleEvent::RotationChanged(DeviceRotation::Rotation270));
    assert_eq!(control.display_orientation(), Some(180));
}

#[test]
fn test_events_before_create_are_ignored() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let (mut activity, control, _events) = create_test_activity(config);

    assert_eq!(activity.handle(LifecycleEvent::Shutter), ControlFlow::Continue(()));
    assert_eq!(
        activity.handle(LifecycleEvent::SurfaceDestroyed),
        ControlFlow::Continue(())
    );
    assert!(activity.preview().is_none());
    assert_eq!(control.open_count(), 0);
}

#[test]
fn test_front_camera_orientation() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = create_test_config(temp.path());
    config.camera.facing = CameraFacing::Front;
    config.camera.mount_angle = 270;
    config.display.rotation = DeviceRotation::Rotation90;
    let (mut activity, control, _events) = create_test_activity(config.clone());
    start(&mut activity, &config);

    assert_eq!(control.display_orientation(), Some(0));
}

#[test]
fn test_run_loop_stops_on_quit() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let (activity, control, _events) = create_test_activity(config.clone());

    let (sender, receiver) = crossbeam::channel::unbounded();
    for event in startup_sequence(&config) {
        sender.send(event).unwrap();
    }
    sender.send(LifecycleEvent::Shutter).unwrap();
    for event in shutdown_sequence() {
        sender.send(event).unwrap();
    }
    // Never reached; the loop ends at Quit
    sender.send(LifecycleEvent::Shutter).unwrap();

    let stats = activity.run(receiver);
    assert_eq!(stats.pictures_saved, 1);
    assert_eq!(stats.events_handled, 8);
    assert!(!control.is_held());
    assert_eq!(control.release_count(), 1);
}

#[test]
fn test_snap_tracker() {
    let mut tracker = SnapTracker::new(Some(2));
    assert_eq!(
        tracker.observe(&PreviewEvent::CaptureFailed {
            reason: "early".to_string()
        }),
        0
    );
    assert_eq!(tracker.observe(&PreviewEvent::PreviewStarted { orientation: 90 }), 2);
    assert_eq!(tracker.observe(&PreviewEvent::PreviewStarted { orientation: 90 }), 0);
    tracker.observe(&PreviewEvent::PictureSaved {
        path: "/tmp/a.jpg".into(),
        bytes: 1,
    });
    assert!(!tracker.is_complete());
    tracker.observe(&PreviewEvent::CaptureFailed {
        reason: "io".to_string(),
    });
    assert!(tracker.is_complete());

    let mut idle = SnapTracker::new(None);
    assert_eq!(idle.observe(&PreviewEvent::PreviewStarted { orientation: 0 }), 0);
    assert!(!idle.is_complete());
}

#[test]
fn test_snap_tracker_gives_up_when_camera_unavailable() {
    let unavailable = PreviewEvent::CameraUnavailable {
        index: 0,
        reason: "busy".to_string(),
    };

    let mut tracker = SnapTracker::new(Some(1));
    tracker.observe(&unavailable);
    assert_eq!(tracker.unavailable(), Some("busy"));
    assert!(!tracker.is_complete());

    // Without --snap nothing waits on the camera
    let mut idle = SnapTracker::new(None);
    idle.observe(&unavailable);
    assert_eq!(idle.unavailable(), None);

    // Once pictures are under way a later failure to reopen is not fatal
    let mut started = SnapTracker::new(Some(1));
    started.observe(&PreviewEvent::PreviewStarted { orientation: 90 });
    started.observe(&unavailable);
    assert_eq!(started.unavailable(), None);
}

#[test]
fn test_keyboard_mapping() {
    let mut paused = false;
    assert_eq!(
        events_for_key(KeyCode::Char(' '), &mut paused),
        vec![LifecycleEvent::Shutter]
    );
    assert_eq!(
        events_for_key(KeyCode::Char('p'), &mut paused),
        vec![LifecycleEvent::Pause]
    );
    assert_eq!(
        events_for_key(KeyCode::Char('p'), &mut paused),
        vec![LifecycleEvent::Resume]
    );
    assert_eq!(
        events_for_key(KeyCode::Esc, &mut paused).last(),
        Some(&LifecycleEvent::Quit)
    );
    assert!(events_for_key(KeyCode::Char('x'), &mut paused).is_empty());
}

#[tokio::test]
async fn test_run_with_snap_saves_pictures() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let provider = Arc::new(MockCameraProvider::new(
        CameraInfo::new(CameraFacing::Back, 90),
        (640, 480),
    ));
    let control = provider.control();

    let stats = run(
        config,
        provider,
        RunOptions {
            keyboard: false,
            snap: Some(1),
        },
    )
    .await
    .unwrap();

    assert_eq!(stats.pictures_saved, 1);
    assert_eq!(control.pictures_taken(), 1);
    assert!(!control.is_held());
    assert_eq!(
        std::fs::read_dir(temp.path().join("MyCameraApp"))
            .unwrap()
            .count(),
        1
    );
}

#[tokio::test]
async fn test_run_with_snap_exits_when_camera_busy() {
    let temp = tempfile::tempdir().unwrap();
    let config = create_test_config(temp.path());
    let provider = Arc::new(MockCameraProvider::new(
        CameraInfo::new(CameraFacing::Back, 90),
        (640, 480),
    ));
    let control = provider.control();
    control.set_busy(true);

    let stats = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        run(
            config,
            provider,
            RunOptions {
                keyboard: false,
                snap: Some(1),
            },
        ),
    )
    .await
    .expect("run should end when the camera cannot be opened")
    .unwrap();

    assert_eq!(stats.pictures_saved, 0);
    assert_eq!(control.open_count(), 0);
    assert_eq!(control.pictures_taken(), 0);
}
