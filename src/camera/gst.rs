use super::device::{CameraDevice, CameraProvider, CameraResult};
use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::orientation::CameraInfo;
use crate::surface::Surface;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, Pipeline, State};
use gstreamer_app::AppSink;
use std::path::Path;
use tracing::{debug, info, warn};

const STILL_TIMEOUT_SECONDS: u64 = 3;

/// V4L2 cameras reached through GStreamer
pub struct GstCameraProvider {
    config: CameraConfig,
}

impl GstCameraProvider {
    pub fn new(config: CameraConfig) -> CameraResult<Self> {
        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;
        Ok(Self { config })
    }

    fn device_path(index: u32) -> String {
        format!("/dev/video{}", index)
    }
}

impl CameraProvider for GstCameraProvider {
    fn open(&self, index: u32) -> CameraResult<Box<dyn CameraDevice>> {
        let device = Self::device_path(index);
        if !Path::new(&device).exists() {
            return Err(CameraError::DeviceOpen {
                index,
                details: format!("{} does not exist", device),
            });
        }

        // v4l2src opens the device in READY; a busy device fails here
        let probe = launch(&format!("v4l2src device={} ! fakesink", device)).map_err(|e| {
            CameraError::DeviceOpen {
                index,
                details: e.to_string(),
            }
        })?;
        let probe_result = probe.set_state(State::Ready);
        let _ = probe.set_state(State::Null);
        probe_result.map_err(|e| CameraError::DeviceOpen {
            index,
            details: format!("{} could not be opened: {}", device, e),
        })?;

        info!(
            "Opened V4L2 camera {} ({}x{} @ {}fps)",
            device, self.config.resolution.0, self.config.resolution.1, self.config.fps
        );

        Ok(Box::new(GstCameraDevice {
            device,
            config: self.config.clone(),
            info: CameraInfo::new(self.config.facing, self.config.mount_angle),
            sink: None,
            flip_method: flip_method(0),
            picture_rotation: 0,
            pipeline: None,
            released: false,
        }))
    }

    fn name(&self) -> &'static str {
        "gstreamer"
    }
}

struct GstCameraDevice {
    device: String,
    config: CameraConfig,
    info: CameraInfo,
    sink: Option<String>,
    flip_method: &'static str,
    picture_rotation: u16,
    pipeline: Option<Pipeline>,
    released: bool,
}

impl GstCameraDevice {
    fn ensure_open(&self, operation: &'static str) -> CameraResult<()> {
        if self.released {
            Err(CameraError::NotOpen { operation })
        } else {
            Ok(())
        }
    }

    /// MJPEG from the sensor, teed to the preview sink and to a still-capture appsink
    fn build_pipeline_string(&self, sink: &str) -> String {
        let (width, height) = self.config.resolution;
        format!(
            "v4l2src device={} io-mode=mmap do-timestamp=true ! \
             image/jpeg,width={},height={},framerate={}/1 ! tee name=t \
             t. ! queue max-size-buffers=2 leaky=downstream ! jpegdec ! videoconvert ! \
             videoflip name=flip method={} ! {} sync=false \
             t. ! queue max-size-buffers=2 leaky=downstream ! \
             appsink name=still sync=false max-buffers=1 drop=true emit-signals=false",
            self.device, width, height, self.config.fps, self.flip_method, sink
        )
    }

    fn pipeline(&mut self, operation: &'static str) -> CameraResult<&Pipeline> {
        if self.pipeline.is_none() {
            let sink = self
                .sink
                .clone()
                .ok_or(CameraError::NoSurface { operation })?;
            let description = self.build_pipeline_string(&sink);
            debug!("Creating GStreamer pipeline: {}", description);
            self.pipeline = Some(launch(&description)?);
        }
        self.pipeline
            .as_ref()
            .ok_or(CameraError::NoSurface { operation })
    }

    fn teardown(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            let _ = pipeline.set_state(State::Null);
        }
    }
}

impl CameraDevice for GstCameraDevice {
    fn info(&self) -> CameraInfo {
        self.info
    }

    fn set_display_orientation(&mut self, degrees: u16) -> CameraResult<()> {
        self.ensure_open("set_display_orientation")?;
        self.flip_method = flip_method(degrees);
        if let Some(flip) = self.pipeline.as_ref().and_then(|p| p.by_name("flip")) {
            flip.set_property_from_str("method", self.flip_method);
        }
        Ok(())
    }

    fn set_preview_surface(&mut self, surface: &Surface) -> CameraResult<()> {
        self.ensure_open("set_preview_surface")?;
        if self.sink.as_deref() != Some(surface.sink.as_str()) {
            self.teardown();
            self.sink = Some(surface.sink.clone());
        }
        Ok(())
    }

    fn start_preview(&mut self) -> CameraResult<()> {
        self.ensure_open("start_preview")?;
        let pipeline = self.pipeline("start_preview")?;
        pipeline
            .set_state(State::Playing)
            .map_err(|e| CameraError::operation("start_preview", e.to_string()))?;
        Ok(())
    }

    fn stop_preview(&mut self) -> CameraResult<()> {
        self.ensure_open("stop_preview")?;
        if let Some(pipeline) = &self.pipeline {
            pipeline
                .set_state(State::Paused)
                .map_err(|e| CameraError::operation("stop_preview", e.to_string()))?;
        }
        Ok(())
    }

    fn set_picture_rotation(&mut self, degrees: u16) -> CameraResult<()> {
        self.ensure_open("set_picture_rotation")?;
        // Stills are stored as delivered by the sensor; the rotation is informational
        self.picture_rotation = degrees;
        Ok(())
    }

    fn take_picture(&mut self) -> CameraResult<Vec<u8>> {
        self.ensure_open("take_picture")?;
        let rotation = self.picture_rotation;
        let pipeline = self.pipeline("take_picture")?.clone();

        let appsink = pipeline
            .by_name("still")
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| CameraError::operation("take_picture", "still sink missing"))?;

        let sample = appsink.try_pull_sample(ClockTime::from_seconds(STILL_TIMEOUT_SECONDS));

        // Preview is suspended after a still, as on platform cameras
        if let Err(e) = pipeline.set_state(State::Paused) {
            warn!("Failed to pause preview after capture: {}", e);
        }

        let sample = sample
            .ok_or_else(|| CameraError::operation("take_picture", "no frame within timeout"))?;
        let buffer = sample
            .buffer()
            .ok_or_else(|| CameraError::operation("take_picture", "no buffer in sample"))?;
        let map = buffer
            .map_readable()
            .map_err(|e| CameraError::operation("take_picture", e.to_string()))?;

        debug!(
            "Captured still from {} ({} bytes, rotation {})",
            self.device,
            map.len(),
            rotation
        );
        Ok(map.as_slice().to_vec())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.teardown();
        self.released = true;
        debug!("Released V4L2 camera {}", self.device);
    }
}

impl Drop for GstCameraDevice {
    fn drop(&mut self) {
        self.release();
    }
}

fn launch(description: &str) -> CameraResult<Pipeline> {
    gstreamer::parse::launch(description)
        .map_err(|e| CameraError::Configuration {
            details: format!("Failed to create pipeline: {}", e),
        })?
        .downcast::<Pipeline>()
        .map_err(|_| CameraError::Configuration {
            details: "Failed to downcast to Pipeline".to_string(),
        })
}

fn flip_method(degrees: u16) -> &'static str {
    match degrees % 360 {
        90 => "clockwise",
        180 => "rotate-180",
        270 => "counterclockwise",
        _ => "none",
    }
}
