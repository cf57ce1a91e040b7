use crate::orientation::DeviceRotation;
use crate::surface::Surface;

/// Callbacks delivered to the activity, in the order the platform raises them
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Create,
    Resume,
    Pause,
    Destroy,
    SurfaceCreated(Surface),
    SurfaceChanged { format: u32, width: u32, height: u32 },
    SurfaceDestroyed,
    RotationChanged(DeviceRotation),
    /// Rotate the device a quarter turn clockwise from wherever it is
    RotateClockwise,
    /// The shutter button was pressed
    Shutter,
    Quit,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
    CapturesComplete,
}

/// Totals reported when the activity loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    pub events_handled: u64,
    pub pictures_saved: u32,
    pub captures_failed: u32,
}
