use crate::orientation::{CameraFacing, DeviceRotation};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CampreviewConfig {
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub capture: CaptureConfig,
    pub worker: WorkerConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Camera backend ("mock" or "gstreamer")
    #[serde(default = "default_camera_backend")]
    pub backend: String,

    /// Camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Direction the sensor faces, used when the device does not report it
    #[serde(default)]
    pub facing: CameraFacing,

    /// Clockwise sensor mount angle in degrees, used when the device does not report it
    #[serde(default = "default_mount_angle")]
    pub mount_angle: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Initial device rotation in degrees
    #[serde(default)]
    pub rotation: DeviceRotation,

    /// Sink that renders the preview surface
    #[serde(default = "default_surface_sink")]
    pub surface_sink: String,

    /// Initial surface size (width, height)
    #[serde(default = "default_surface_size")]
    pub surface_size: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Enable the shutter action
    #[serde(default = "default_capture_enabled")]
    pub enabled: bool,

    /// Public pictures directory; the user's picture folder when unset
    #[serde(default)]
    pub pictures_dir: Option<String>,

    /// Application subdirectory under the pictures directory
    #[serde(default = "default_album")]
    pub album: String,

    /// File name prefix for saved pictures
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Timezone for file name timestamps ("local" for system time)
    #[serde(default = "default_timestamp_timezone")]
    pub timestamp_timezone: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Open the camera on a dedicated background thread
    #[serde(default = "default_worker_enabled")]
    pub enabled: bool,

    /// How long the caller waits for the background open to finish
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl CampreviewConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("campreview.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("camera.index", default_camera_index())?
            .set_default("camera.backend", default_camera_backend())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.facing", "back")?
            .set_default("camera.mount_angle", default_mount_angle() as i64)?
            .set_default("display.rotation", 0i64)?
            .set_default("display.surface_sink", default_surface_sink())?
            .set_default(
                "display.surface_size",
                vec![default_surface_size().0, default_surface_size().1],
            )?
            .set_default("capture.enabled", default_capture_enabled())?
            .set_default("capture.album", default_album())?
            .set_default("capture.file_prefix", default_file_prefix())?
            .set_default(
                "capture.timestamp_timezone",
                default_timestamp_timezone(),
            )?
            .set_default("worker.enabled", default_worker_enabled())?
            .set_default("worker.open_timeout_ms", default_open_timeout_ms() as i64)?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables, e.g. CAMPREVIEW__CAMERA__INDEX
            .add_source(Environment::with_prefix("CAMPREVIEW").separator("__"))
            .build()?;

        let config: CampreviewConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.mount_angle >= 360 || self.camera.mount_angle % 90 != 0 {
            return Err(ConfigError::Message(format!(
                "Camera mount_angle must be 0, 90, 180 or 270 (got {})",
                self.camera.mount_angle
            )));
        }

        if !matches!(self.camera.backend.as_str(), "mock" | "gstreamer") {
            return Err(ConfigError::Message(format!(
                "Unknown camera backend '{}'",
                self.camera.backend
            )));
        }

        if self.capture.album.is_empty() {
            return Err(ConfigError::Message(
                "Capture album must not be empty".to_string(),
            ));
        }

        if self.worker.enabled && self.worker.open_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Worker open_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load from `path`, apply a backend override and validate the result
    pub fn load_validated<P: AsRef<Path>>(
        path: P,
        backend: Option<&str>,
    ) -> crate::error::Result<Self> {
        let mut config = Self::load_from_file(path)?;
        if let Some(backend) = backend {
            config.camera.backend = backend.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for CampreviewConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                index: default_camera_index(),
                backend: default_camera_backend(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                facing: CameraFacing::default(),
                mount_angle: default_mount_angle(),
            },
            display: DisplayConfig {
                rotation: DeviceRotation::default(),
                surface_sink: default_surface_sink(),
                surface_size: default_surface_size(),
            },
            capture: CaptureConfig {
                enabled: default_capture_enabled(),
                pictures_dir: None,
                album: default_album(),
                file_prefix: default_file_prefix(),
                timestamp_timezone: default_timestamp_timezone(),
            },
            worker: WorkerConfig {
                enabled: default_worker_enabled(),
                open_timeout_ms: default_open_timeout_ms(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_camera_index() -> u32 {
    0
}
fn default_camera_backend() -> String {
    "mock".to_string()
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_mount_angle() -> u16 {
    90
}

fn default_surface_sink() -> String {
    "autovideosink".to_string()
}
fn default_surface_size() -> (u32, u32) {
    (640, 480)
}

fn default_capture_enabled() -> bool {
    true
}
fn default_album() -> String {
    "MyCameraApp".to_string()
}
fn default_file_prefix() -> String {
    "IMG_".to_string()
}
fn default_timestamp_timezone() -> String {
    "local".to_string()
}

fn default_worker_enabled() -> bool {
    true
}
fn default_open_timeout_ms() -> u64 {
    5000
}

fn default_event_bus_capacity() -> usize {
    64
}
