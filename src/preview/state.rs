use std::fmt;

/// Lifecycle states of the preview view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    CameraOpening,
    CameraOpen,
    PreviewRunning,
    Capturing,
}

impl fmt::Display for PreviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreviewState::Idle => "idle",
            PreviewState::CameraOpening => "camera-opening",
            PreviewState::CameraOpen => "camera-open",
            PreviewState::PreviewRunning => "preview-running",
            PreviewState::Capturing => "capturing",
        };
        f.write_str(name)
    }
}
