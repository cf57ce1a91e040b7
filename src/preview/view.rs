use super::PreviewState;
use crate::camera::{CameraDevice, CameraOpener, CameraResult};
use crate::capture::{CaptureOutcome, PictureStore};
use crate::error::CameraError;
use crate::events::{EventBus, PreviewEvent};
use crate::orientation::{display_orientation, DeviceRotation};
use crate::surface::{Surface, SurfaceHolder};
use std::time::SystemTime;
use tracing::{debug, error, info, trace, warn};

/// Owns the camera handle and the preview surface, and drives the
/// open/preview/capture sequence from lifecycle callbacks.
///
/// Device failures never escape: they are logged, the state falls back to
/// the last consistent value, and a later callback is expected to recover.
pub struct PreviewView {
    camera_index: u32,
    opener: CameraOpener,
    camera: Option<Box<dyn CameraDevice>>,
    holder: SurfaceHolder,
    state: PreviewState,
    display_rotation: DeviceRotation,
    store: Option<PictureStore>,
    events: Option<EventBus>,
}

impl PreviewView {
    /// Create a view; pass a store to enable the shutter action
    pub fn new(
        camera_index: u32,
        opener: CameraOpener,
        display_rotation: DeviceRotation,
        store: Option<PictureStore>,
    ) -> Self {
        Self {
            camera_index,
            opener,
            camera: None,
            holder: SurfaceHolder::new(),
            state: PreviewState::Idle,
            display_rotation,
            store,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.holder.surface()
    }

    pub fn display_rotation(&self) -> DeviceRotation {
        self.display_rotation
    }

    pub fn capture_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Orientation the preview is (or would be) rendered with
    pub fn orientation(&self) -> Option<u16> {
        self.camera
            .as_ref()
            .map(|camera| display_orientation(&camera.info(), self.display_rotation))
    }

    fn transition(&mut self, next: PreviewState) {
        if self.state != next {
            debug!("Preview state {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn publish(&self, event: PreviewEvent) {
        if let Some(events) = &self.events {
            // Nobody listening is fine
            let _ = events.publish(event);
        }
    }

    /// Make sure a camera is held; opening it if needed. Returns whether one is held.
    pub fn attach_camera(&mut self) -> bool {
        if self.camera.is_some() {
            trace!("Camera {} already attached", self.camera_index);
            return true;
        }

        self.transition(PreviewState::CameraOpening);
        match self.opener.open(self.camera_index) {
            Ok(camera) => {
                self.camera = Some(camera);
                self.transition(PreviewState::CameraOpen);
                info!("Camera {} attached", self.camera_index);
                self.publish(PreviewEvent::CameraOpened {
                    index: self.camera_index,
                    timestamp: SystemTime::now(),
                });
                true
            }
            Err(e) => {
                warn!("Camera {} is not available: {}", self.camera_index, e);
                self.transition(PreviewState::Idle);
                self.publish(PreviewEvent::CameraUnavailable {
                    index: self.camera_index,
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Start streaming to the current surface. Returns whether preview is running.
    pub fn start_preview(&mut self) -> bool {
        if !self.attach_camera() {
            return false;
        }

        let surface = match self.holder.surface() {
            Some(surface) => surface.clone(),
            None => {
                debug!(
                    "Deferring camera preview: {}",
                    CameraError::NoSurface {
                        operation: "start_preview"
                    }
                );
                return false;
            }
        };

        let rotation = self.display_rotation;
        let result = match self.camera.as_mut() {
            Some(camera) => begin_preview(&mut **camera, rotation, &surface),
            None => Err(CameraError::NotOpen {
                operation: "start_preview",
            }),
        };

        match result {
            Ok(orientation) => {
                self.transition(PreviewState::PreviewRunning);
                info!(
                    "Preview running on surface {} (orientation {}°)",
                    surface.id, orientation
                );
                self.publish(PreviewEvent::PreviewStarted { orientation });
                true
            }
            Err(e) => {
                warn!("Error setting camera preview: {}", e);
                self.transition(PreviewState::CameraOpen);
                false
            }
        }
    }

    /// Stop streaming; failures are ignored
    pub fn stop_preview(&mut self) {
        let Some(camera) = self.camera.as_mut() else {
            return;
        };

        if let Err(e) = camera.stop_preview() {
            // tried to stop a non-existent preview
            debug!("Ignoring stop_preview failure: {}", e);
        }

        if self.state == PreviewState::PreviewRunning {
            self.transition(PreviewState::CameraOpen);
            self.publish(PreviewEvent::PreviewStopped);
        }
    }

    /// Stop preview and give the camera back. Safe to call when nothing is held.
    pub fn release(&mut self) {
        match self.camera.take() {
            Some(mut camera) => {
                if let Err(e) = camera.stop_preview() {
                    debug!("Ignoring stop_preview failure during release: {}", e);
                }
                camera.release();
                info!("Camera {} released", self.camera_index);
                self.publish(PreviewEvent::CameraReleased {
                    timestamp: SystemTime::now(),
                });
            }
            None => trace!("Release requested with no camera attached"),
        }
        self.transition(PreviewState::Idle);
    }

    pub fn surface_created(&mut self, surface: Surface) {
        info!("Surface created");
        self.holder.created(surface);
        self.attach_camera();
    }

    /// Restart preview with the new geometry and current orientation
    pub fn surface_changed(&mut self, format: u32, width: u32, height: u32) {
        info!("Surface changed ({}x{})", width, height);
        if !self.holder.changed(format, width, height) {
            debug!("Preview surface does not exist");
            return;
        }

        self.stop_preview();
        self.start_preview();
    }

    pub fn surface_destroyed(&mut self) {
        info!("Surface destroyed");
        self.release();
        self.holder.destroyed();
    }

    /// Record a new device rotation; a running preview is restarted with it
    pub fn set_display_rotation(&mut self, rotation: DeviceRotation) {
        if self.display_rotation == rotation {
            return;
        }

        info!("Device rotation changed to {}", rotation);
        self.display_rotation = rotation;
        if self.state == PreviewState::PreviewRunning {
            self.stop_preview();
            self.start_preview();
        }
    }

    /// Take one picture and save it, then resume preview
    pub fn capture(&mut self) -> CaptureOutcome {
        let Some(store) = self.store.clone() else {
            debug!("Shutter ignored: capture is disabled");
            return CaptureOutcome::Skipped;
        };

        if self.state != PreviewState::PreviewRunning {
            let reason = format!("preview is not running ({})", self.state);
            warn!("Shutter ignored: {}", reason);
            self.publish(PreviewEvent::CaptureFailed { reason });
            return CaptureOutcome::Skipped;
        }

        if let Err(e) = store.ensure_directory() {
            error!("Failed to create picture directory: {}", e);
            let reason = e.to_string();
            self.publish(PreviewEvent::CaptureFailed {
                reason: reason.clone(),
            });
            return CaptureOutcome::Aborted { reason };
        }

        let rotation = self.display_rotation;
        self.transition(PreviewState::Capturing);

        let picture = match self.camera.as_mut() {
            Some(camera) => take_rotated_picture(&mut **camera, rotation),
            None => Err(CameraError::NotOpen {
                operation: "take_picture",
            }),
        };

        let outcome = match picture {
            Ok(data) => match store.save(&data, SystemTime::now()) {
                Ok(path) => {
                    info!("Saved picture {} ({} bytes)", path.display(), data.len());
                    self.publish(PreviewEvent::PictureSaved {
                        path: path.clone(),
                        bytes: data.len(),
                    });
                    CaptureOutcome::Saved(path)
                }
                Err(e) => {
                    error!("Error accessing file: {}", e);
                    self.discard(e.to_string())
                }
            },
            Err(e) => {
                error!("Failed to take picture: {}", e);
                self.discard(e.to_string())
            }
        };

        // Preview resumes whether or not the picture was kept
        self.start_preview();
        outcome
    }

    fn discard(&self, reason: String) -> CaptureOutcome {
        self.publish(PreviewEvent::CaptureFailed {
            reason: reason.clone(),
        });
        CaptureOutcome::Discarded { reason }
    }
}

impl Drop for PreviewView {
    fn drop(&mut self) {
        self.release();
    }
}

fn begin_preview(
    camera: &mut dyn CameraDevice,
    rotation: DeviceRotation,
    surface: &Surface,
) -> CameraResult<u16> {
    let orientation = display_orientation(&camera.info(), rotation);
    camera.set_display_orientation(orientation)?;
    camera.set_preview_surface(surface)?;
    camera.start_preview()?;
    Ok(orientation)
}

fn take_rotated_picture(
    camera: &mut dyn CameraDevice,
    rotation: DeviceRotation,
) -> CameraResult<Vec<u8>> {
    let orientation = display_orientation(&camera.info(), rotation);
    if let Err(e) = camera.set_picture_rotation(orientation) {
        warn!("Failed to set picture rotation: {}", e);
    }
    camera.take_picture()
}
