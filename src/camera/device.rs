use crate::error::CameraError;
use crate::orientation::CameraInfo;
use crate::surface::Surface;

pub type CameraResult<T> = std::result::Result<T, CameraError>;

/// An opened camera device.
///
/// Exactly one owner holds a device at a time; dropping it without calling
/// [`CameraDevice::release`] is allowed but implementations release on drop too.
pub trait CameraDevice: Send {
    /// Facing and mount angle of the sensor
    fn info(&self) -> CameraInfo;

    fn set_display_orientation(&mut self, degrees: u16) -> CameraResult<()>;

    fn set_preview_surface(&mut self, surface: &Surface) -> CameraResult<()>;

    fn start_preview(&mut self) -> CameraResult<()>;

    fn stop_preview(&mut self) -> CameraResult<()>;

    /// Rotation recorded with the next still capture
    fn set_picture_rotation(&mut self, degrees: u16) -> CameraResult<()>;

    /// Take one still picture and return the encoded bytes.
    ///
    /// Preview is suspended once this returns and must be restarted by the caller.
    fn take_picture(&mut self) -> CameraResult<Vec<u8>>;

    /// Release the underlying device. Calling this more than once is a no-op.
    fn release(&mut self);
}

/// Source of camera devices
pub trait CameraProvider: Send + Sync {
    /// Open a camera; fails when the device is busy or absent
    fn open(&self, index: u32) -> CameraResult<Box<dyn CameraDevice>>;

    fn name(&self) -> &'static str;
}
