use super::*;
use crate::config::WorkerConfig;
use crate::error::CameraError;
use crate::orientation::{CameraFacing, CameraInfo};
use crate::surface::Surface;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn create_test_provider() -> (Arc<MockCameraProvider>, MockCameraControl) {
    let provider = Arc::new(MockCameraProvider::new(
        CameraInfo::new(CameraFacing::Back, 90),
        (640, 480),
    ));
    let control = provider.control();
    (provider, control)
}

fn worker_strategy(timeout_ms: u64) -> OpenStrategy {
    OpenStrategy::Worker {
        timeout: Duration::from_millis(timeout_ms),
    }
}

#[test]
fn test_mock_camera_is_exclusive() {
    let (provider, control) = create_test_provider();

    let mut first = provider.open(0).unwrap();
    assert!(control.is_held());

    match provider.open(0) {
        Err(CameraError::DeviceOpen { index: 0, .. }) => {}
        other => panic!("Expected busy camera, got {:?}", other.map(|_| ())),
    }

    first.release();
    first.release();
    assert_eq!(control.release_count(), 1);
    assert!(provider.open(0).is_ok());
}

#[test]
fn test_mock_camera_absent_and_busy() {
    let (provider, control) = create_test_provider();

    control.set_present(false);
    assert!(matches!(provider.open(0), Err(CameraError::DeviceOpen { .. })));

    control.set_present(true);
    control.set_busy(true);
    assert!(matches!(provider.open(0), Err(CameraError::DeviceOpen { .. })));
    assert_eq!(control.open_count(), 0);
}

#[test]
fn test_mock_preview_requires_surface() {
    let (provider, control) = create_test_provider();
    let mut camera = provider.open(0).unwrap();

    assert!(matches!(
        camera.start_preview(),
        Err(CameraError::NoSurface { .. })
    ));

    let surface = Surface::new("fakesink", 640, 480);
    camera.set_preview_surface(&surface).unwrap();
    camera.start_preview().unwrap();
    assert!(control.is_previewing());
    assert_eq!(control.preview_surface(), Some(surface.id));
}

#[test]
fn test_mock_take_picture_suspends_preview() {
    let (provider, control) = create_test_provider();
    let mut camera = provider.open(0).unwrap();
    camera
        .set_preview_surface(&Surface::new("fakesink", 640, 480))
        .unwrap();

    // Platform cameras refuse stills without a running preview
    assert!(camera.take_picture().is_err());

    camera.start_preview().unwrap();
    let jpeg = camera.take_picture().unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    assert!(!control.is_previewing());
    assert_eq!(control.pictures_taken(), 1);
}

#[test]
fn test_released_camera_rejects_operations() {
    let (provider, _control) = create_test_provider();
    let mut camera = provider.open(0).unwrap();
    camera.release();

    assert!(matches!(
        camera.set_display_orientation(90),
        Err(CameraError::NotOpen { .. })
    ));
    assert!(matches!(camera.stop_preview(), Err(CameraError::NotOpen { .. })));
}

#[test]
fn test_direct_open_does_not_spawn_worker() {
    let (provider, control) = create_test_provider();
    let mut opener = CameraOpener::new(provider, OpenStrategy::Direct);

    let camera = opener.open(0).unwrap();
    assert!(!opener.has_worker());
    assert_eq!(control.open_count(), 1);
    drop(camera);
    assert_eq!(control.release_count(), 1);
}

#[test]
fn test_worker_is_created_lazily_and_reused() {
    let (provider, control) = create_test_provider();
    let mut opener = CameraOpener::new(provider, worker_strategy(1000));
    assert!(!opener.has_worker());

    let mut camera = opener.open(0).unwrap();
    assert!(opener.has_worker());
    assert!(!opener.is_in_flight());
    camera.release();

    let _camera = opener.open(0).unwrap();
    assert_eq!(control.open_count(), 2);
}

#[test]
fn test_worker_reports_open_failure() {
    let (provider, control) = create_test_provider();
    control.set_busy(true);
    let mut opener = CameraOpener::new(provider, worker_strategy(1000));

    assert!(matches!(opener.open(0), Err(CameraError::DeviceOpen { .. })));
    assert!(!opener.is_in_flight());
}

#[test]
fn test_worker_timeout_releases_late_device() {
    let (provider, control) = create_test_provider();
    control.set_open_delay(Duration::from_millis(300));
    let mut opener = CameraOpener::new(provider, worker_strategy(50));

    assert!(matches!(
        opener.open(0),
        Err(CameraError::OpenTimeout { .. })
    ));

    // The previous request is still running on the worker
    assert!(opener.is_in_flight());
    assert!(matches!(opener.open(0), Err(CameraError::OpenInFlight)));

    std::thread::sleep(Duration::from_millis(600));
    assert!(!opener.is_in_flight());
    assert_eq!(control.open_count(), 1);
    assert_eq!(control.release_count(), 1);
    assert!(!control.is_held());

    control.set_open_delay(Duration::ZERO);
    assert!(opener.open(0).is_ok());
}

/// Panics on the first open, then behaves like the mock
struct PanicOnceProvider {
    inner: MockCameraProvider,
    opens: AtomicUsize,
}

impl CameraProvider for PanicOnceProvider {
    fn open(&self, index: u32) -> CameraResult<Box<dyn CameraDevice>> {
        if self.opens.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("driver crashed");
        }
        self.inner.open(index)
    }

    fn name(&self) -> &'static str {
        "panic-once"
    }
}

#[test]
fn test_worker_restarts_after_panic() {
    let provider = Arc::new(PanicOnceProvider {
        inner: MockCameraProvider::new(CameraInfo::new(CameraFacing::Back, 90), (640, 480)),
        opens: AtomicUsize::new(0),
    });
    let control = provider.inner.control();
    let mut opener = CameraOpener::new(provider, worker_strategy(1000));

    assert!(matches!(opener.open(0), Err(CameraError::WorkerUnavailable)));
    assert!(!opener.is_in_flight());
    assert!(!opener.has_worker());

    let _camera = opener.open(0).unwrap();
    assert!(opener.has_worker());
    assert_eq!(control.open_count(), 1);
}

#[test]
fn test_strategy_from_worker_config() {
    let enabled = WorkerConfig {
        enabled: true,
        open_timeout_ms: 1500,
    };
    assert_eq!(OpenStrategy::from(&enabled), worker_strategy(1500));

    let disabled = WorkerConfig {
        enabled: false,
        open_timeout_ms: 1500,
    };
    assert_eq!(OpenStrategy::from(&disabled), OpenStrategy::Direct);
}

#[test]
fn test_provider_builder() {
    let config = crate::config::CampreviewConfig::default().camera;
    let provider = CameraProviderBuilder::new().config(config.clone()).build().unwrap();
    assert_eq!(provider.name(), "mock");

    let mut camera = provider.open(0).unwrap();
    assert_eq!(camera.info(), CameraInfo::new(CameraFacing::Back, 90));
    camera.release();

    let mut unknown = config;
    unknown.backend = "v4l1".to_string();
    assert!(CameraProviderBuilder::new().config(unknown).build().is_err());
}

#[test]
fn test_provider_builder_requires_config() {
    match CameraProviderBuilder::new().build() {
        Err(crate::error::CampreviewError::System { message }) => {
            assert!(message.contains("Camera configuration must be specified"));
        }
        _ => panic!("Expected system error for missing configuration"),
    }
}
