mod outcome;
mod store;

pub use outcome::CaptureOutcome;
pub use store::{CaptureTimezone, PictureStore};
