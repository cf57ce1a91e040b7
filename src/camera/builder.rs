use super::device::CameraProvider;
use super::mock::MockCameraProvider;
use crate::config::CameraConfig;
use crate::error::{CameraError, CampreviewError, Result};
use crate::orientation::CameraInfo;
use std::sync::Arc;
use tracing::info;

/// Builder for the configured camera backend
pub struct CameraProviderBuilder {
    config: Option<CameraConfig>,
}

impl CameraProviderBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Arc<dyn CameraProvider>> {
        let config = self
            .config
            .ok_or_else(|| CampreviewError::system("Camera configuration must be specified"))?;

        info!("Using {} camera backend", config.backend);
        match config.backend.as_str() {
            "mock" => Ok(Arc::new(MockCameraProvider::new(
                CameraInfo::new(config.facing, config.mount_angle),
                config.resolution,
            ))),
            "gstreamer" => gstreamer_provider(config),
            other => Err(CameraError::Configuration {
                details: format!("Unknown camera backend '{}'", other),
            }
            .into()),
        }
    }
}

impl Default for CameraProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(target_os = "linux", feature = "camera"))]
fn gstreamer_provider(config: CameraConfig) -> Result<Arc<dyn CameraProvider>> {
    Ok(Arc::new(super::gst::GstCameraProvider::new(config)?))
}

#[cfg(not(all(target_os = "linux", feature = "camera")))]
fn gstreamer_provider(_config: CameraConfig) -> Result<Arc<dyn CameraProvider>> {
    Err(CameraError::Configuration {
        details: "the gstreamer backend needs Linux and the `camera` feature".to_string(),
    }
    .into())
}
