use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampreviewError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("System error: {message}")]
    System { message: String },
}

/// Failures reported by a camera device or by the open hand-off
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera {index} is not available: {details}")]
    DeviceOpen { index: u32, details: String },

    #[error("No preview surface available for {operation}")]
    NoSurface { operation: &'static str },

    #[error("Camera is not open ({operation})")]
    NotOpen { operation: &'static str },

    #[error("Camera operation {operation} failed: {details}")]
    Operation {
        operation: &'static str,
        details: String,
    },

    #[error("Camera open did not complete within {timeout:?}")]
    OpenTimeout { timeout: Duration },

    #[error("A camera open request is already in flight")]
    OpenInFlight,

    #[error("Camera open worker is unavailable")]
    WorkerUnavailable,

    #[error("Camera configuration error: {details}")]
    Configuration { details: String },
}

/// Failures while persisting a captured picture
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to create picture directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write picture {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Camera delivered an empty picture")]
    EmptyPicture,
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },
}

impl CampreviewError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

impl CameraError {
    pub fn operation<S: Into<String>>(operation: &'static str, details: S) -> Self {
        Self::Operation {
            operation,
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CampreviewError>;
