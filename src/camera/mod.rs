mod builder;
mod device;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod gst;
mod mock;
mod opener;
#[cfg(test)]
mod tests;

pub use builder::CameraProviderBuilder;
pub use device::{CameraDevice, CameraProvider, CameraResult};
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use gst::GstCameraProvider;
pub use mock::{MockCameraControl, MockCameraProvider};
pub use opener::{CameraOpener, OpenStrategy};
