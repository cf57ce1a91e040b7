pub mod app;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod orientation;
pub mod preview;
pub mod surface;

pub use app::{ActivityStats, CameraActivity, LifecycleEvent, RunOptions, ShutdownReason};
pub use camera::{
    CameraDevice, CameraOpener, CameraProvider, CameraProviderBuilder, MockCameraProvider,
    OpenStrategy,
};
pub use capture::{CaptureOutcome, PictureStore};
pub use config::CampreviewConfig;
pub use error::{CameraError, CampreviewError, CaptureError, Result};
pub use events::{EventBus, PreviewEvent};
pub use orientation::{display_orientation, CameraFacing, CameraInfo, DeviceRotation};
pub use preview::{PreviewState, PreviewView};
pub use surface::{Surface, SurfaceHolder};
