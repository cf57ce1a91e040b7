use std::path::PathBuf;

/// Result of one shutter action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Picture written to this path
    Saved(PathBuf),
    /// Camera was engaged but the picture could not be taken or written
    Discarded { reason: String },
    /// Picture directory unavailable; the camera was not engaged
    Aborted { reason: String },
    /// Nothing to capture from (capture disabled or preview not running)
    Skipped,
}

impl CaptureOutcome {
    pub fn saved_path(&self) -> Option<&PathBuf> {
        match self {
            CaptureOutcome::Saved(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, CaptureOutcome::Saved(_))
    }
}
