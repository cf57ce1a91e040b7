use super::device::{CameraDevice, CameraProvider, CameraResult};
use crate::error::CameraError;
use crate::orientation::CameraInfo;
use crate::surface::Surface;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

#[derive(Debug)]
struct MockState {
    present: bool,
    busy: bool,
    held: bool,
    open_delay: Duration,
    fail_start_preview: bool,
    fail_take_picture: bool,
    opens: u32,
    releases: u32,
    previewing: bool,
    preview_surface: Option<u64>,
    display_orientation: Option<u16>,
    picture_rotation: Option<u16>,
    pictures_taken: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            present: true,
            busy: false,
            held: false,
            open_delay: Duration::ZERO,
            fail_start_preview: false,
            fail_take_picture: false,
            opens: 0,
            releases: 0,
            previewing: false,
            preview_surface: None,
            display_orientation: None,
            picture_rotation: None,
            pictures_taken: 0,
        }
    }
}

/// Shared handle for steering and inspecting a mock camera from outside
#[derive(Debug, Clone, Default)]
pub struct MockCameraControl {
    state: Arc<Mutex<MockState>>,
}

impl MockCameraControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another process holding the camera
    pub fn set_busy(&self, busy: bool) {
        self.state.lock().busy = busy;
    }

    /// Simulate the camera being unplugged
    pub fn set_present(&self, present: bool) {
        self.state.lock().present = present;
    }

    pub fn set_open_delay(&self, delay: Duration) {
        self.state.lock().open_delay = delay;
    }

    pub fn fail_start_preview(&self, fail: bool) {
        self.state.lock().fail_start_preview = fail;
    }

    pub fn fail_take_picture(&self, fail: bool) {
        self.state.lock().fail_take_picture = fail;
    }

    pub fn open_count(&self) -> u32 {
        self.state.lock().opens
    }

    pub fn release_count(&self) -> u32 {
        self.state.lock().releases
    }

    pub fn is_held(&self) -> bool {
        self.state.lock().held
    }

    pub fn is_previewing(&self) -> bool {
        self.state.lock().previewing
    }

    pub fn preview_surface(&self) -> Option<u64> {
        self.state.lock().preview_surface
    }

    pub fn display_orientation(&self) -> Option<u16> {
        self.state.lock().display_orientation
    }

    pub fn picture_rotation(&self) -> Option<u16> {
        self.state.lock().picture_rotation
    }

    pub fn pictures_taken(&self) -> u64 {
        self.state.lock().pictures_taken
    }
}

/// In-process camera producing synthetic JPEG stills
pub struct MockCameraProvider {
    info: CameraInfo,
    resolution: (u32, u32),
    control: MockCameraControl,
}

impl MockCameraProvider {
    pub fn new(info: CameraInfo, resolution: (u32, u32)) -> Self {
        Self::with_control(info, resolution, MockCameraControl::new())
    }

    pub fn with_control(
        info: CameraInfo,
        resolution: (u32, u32),
        control: MockCameraControl,
    ) -> Self {
        Self {
            info,
            resolution,
            control,
        }
    }

    pub fn control(&self) -> MockCameraControl {
        self.control.clone()
    }
}

impl CameraProvider for MockCameraProvider {
    fn open(&self, index: u32) -> CameraResult<Box<dyn CameraDevice>> {
        let delay = self.control.state.lock().open_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.control.state.lock();
        if !state.present {
            return Err(CameraError::DeviceOpen {
                index,
                details: "no such camera".to_string(),
            });
        }
        if state.busy || state.held {
            return Err(CameraError::DeviceOpen {
                index,
                details: "camera is in use".to_string(),
            });
        }

        state.held = true;
        state.opens += 1;
        info!("Opened mock camera {} ({}x{})", index, self.resolution.0, self.resolution.1);

        Ok(Box::new(MockCameraDevice {
            index,
            info: self.info,
            resolution: self.resolution,
            control: self.control.clone(),
            released: false,
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct MockCameraDevice {
    index: u32,
    info: CameraInfo,
    resolution: (u32, u32),
    control: MockCameraControl,
    released: bool,
}

impl MockCameraDevice {
    fn ensure_open(&self, operation: &'static str) -> CameraResult<()> {
        if self.released {
            Err(CameraError::NotOpen { operation })
        } else {
            Ok(())
        }
    }

    /// Minimal JFIF stream: SOI, APP0 header, a per-picture pattern, EOI
    fn synthetic_jpeg(&self, picture_id: u64) -> Vec<u8> {
        let mut data = vec![
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x01,
            0x00, 0x48, 0x00, 0x48, 0x00, 0x00,
        ];

        let pattern_size = (self.resolution.0 as usize / 8).max(64) + (picture_id % 500) as usize;
        let pattern_byte = (picture_id % 256) as u8;
        data.extend(vec![pattern_byte; pattern_size]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }
}

impl CameraDevice for MockCameraDevice {
    fn info(&self) -> CameraInfo {
        self.info
    }

    fn set_display_orientation(&mut self, degrees: u16) -> CameraResult<()> {
        self.ensure_open("set_display_orientation")?;
        self.control.state.lock().display_orientation = Some(degrees);
        Ok(())
    }

    fn set_preview_surface(&mut self, surface: &Surface) -> CameraResult<()> {
        self.ensure_open("set_preview_surface")?;
        self.control.state.lock().preview_surface = Some(surface.id);
        Ok(())
    }

    fn start_preview(&mut self) -> CameraResult<()> {
        self.ensure_open("start_preview")?;
        let mut state = self.control.state.lock();
        if state.fail_start_preview {
            return Err(CameraError::operation("start_preview", "injected failure"));
        }
        if state.preview_surface.is_none() {
            return Err(CameraError::NoSurface {
                operation: "start_preview",
            });
        }
        state.previewing = true;
        trace!("Mock camera {} previewing", self.index);
        Ok(())
    }

    fn stop_preview(&mut self) -> CameraResult<()> {
        self.ensure_open("stop_preview")?;
        self.control.state.lock().previewing = false;
        Ok(())
    }

    fn set_picture_rotation(&mut self, degrees: u16) -> CameraResult<()> {
        self.ensure_open("set_picture_rotation")?;
        self.control.state.lock().picture_rotation = Some(degrees);
        Ok(())
    }

    fn take_picture(&mut self) -> CameraResult<Vec<u8>> {
        self.ensure_open("take_picture")?;
        let picture_id = {
            let mut state = self.control.state.lock();
            if !state.previewing {
                return Err(CameraError::operation("take_picture", "preview is not running"));
            }
            // Preview stops for the capture whether or not it succeeds
            state.previewing = false;
            if state.fail_take_picture {
                return Err(CameraError::operation("take_picture", "injected failure"));
            }
            state.pictures_taken += 1;
            state.pictures_taken
        };

        let data = self.synthetic_jpeg(picture_id);
        debug!("Mock camera {} captured picture {} ({} bytes)", self.index, picture_id, data.len());
        Ok(data)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let mut state = self.control.state.lock();
        state.held = false;
        state.previewing = false;
        state.preview_surface = None;
        state.releases += 1;
        debug!("Released mock camera {}", self.index);
    }
}

impl Drop for MockCameraDevice {
    fn drop(&mut self) {
        self.release();
    }
}
