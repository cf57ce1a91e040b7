mod activity;
mod keyboard;
mod runtime;
mod types;

#[cfg(test)]
mod tests;

pub use activity::CameraActivity;
pub use keyboard::KeyboardInputHandler;
pub use runtime::{run, shutdown_sequence, startup_sequence, RunOptions};
pub use types::{ActivityStats, LifecycleEvent, ShutdownReason};
