use crate::error::EventBusError;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::debug;

/// Notable things the preview view reports to the rest of the application
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    /// The camera device was opened
    CameraOpened { index: u32, timestamp: SystemTime },
    /// The camera device could not be opened
    CameraUnavailable { index: u32, reason: String },
    /// The camera device was released
    CameraReleased { timestamp: SystemTime },
    /// Frames are streaming to the surface
    PreviewStarted { orientation: u16 },
    /// Preview streaming stopped
    PreviewStopped,
    /// A still picture was written to disk
    PictureSaved { path: PathBuf, bytes: usize },
    /// A shutter action did not produce a file
    CaptureFailed { reason: String },
}

impl PreviewEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            PreviewEvent::CameraOpened { index, .. } => format!("Camera {} opened", index),
            PreviewEvent::CameraUnavailable { index, reason } => {
                format!("Camera {} unavailable: {}", index, reason)
            }
            PreviewEvent::CameraReleased { .. } => "Camera released".to_string(),
            PreviewEvent::PreviewStarted { orientation } => {
                format!("Preview started (orientation {}°)", orientation)
            }
            PreviewEvent::PreviewStopped => "Preview stopped".to_string(),
            PreviewEvent::PictureSaved { path, bytes } => {
                format!("Saved {} ({} bytes)", path.display(), bytes)
            }
            PreviewEvent::CaptureFailed { reason } => format!("Capture failed: {}", reason),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            PreviewEvent::CameraOpened { .. } => "camera_opened",
            PreviewEvent::CameraUnavailable { .. } => "camera_unavailable",
            PreviewEvent::CameraReleased { .. } => "camera_released",
            PreviewEvent::PreviewStarted { .. } => "preview_started",
            PreviewEvent::PreviewStopped => "preview_stopped",
            PreviewEvent::PictureSaved { .. } => "picture_saved",
            PreviewEvent::CaptureFailed { .. } => "capture_failed",
        }
    }
}

/// Broadcast channel for preview events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PreviewEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<PreviewEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: PreviewEvent) -> Result<usize, EventBusError> {
        debug!("Publishing event: {}", event.description());

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
