use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// A rendering target for preview frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub id: u64,
    /// Sink that presents the frames (a GStreamer element name for the V4L2 backend)
    pub sink: String,
    pub format: u32,
    pub width: u32,
    pub height: u32,
}

impl Surface {
    pub fn new<S: Into<String>>(sink: S, width: u32, height: u32) -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            sink: sink.into(),
            format: 0,
            width,
            height,
        }
    }
}

/// Tracks the surface between its created and destroyed callbacks
#[derive(Debug, Default)]
pub struct SurfaceHolder {
    surface: Option<Surface>,
}

impl SurfaceHolder {
    pub fn new() -> Self {
        Self { surface: None }
    }

    pub fn created(&mut self, surface: Surface) {
        debug!(
            "Surface {} created ({}x{}, sink {})",
            surface.id, surface.width, surface.height, surface.sink
        );
        self.surface = Some(surface);
    }

    /// Apply new geometry; returns false when there is no surface to change
    pub fn changed(&mut self, format: u32, width: u32, height: u32) -> bool {
        match self.surface.as_mut() {
            Some(surface) => {
                surface.format = format;
                surface.width = width;
                surface.height = height;
                debug!("Surface {} changed to {}x{}", surface.id, width, height);
                true
            }
            None => false,
        }
    }

    pub fn destroyed(&mut self) -> Option<Surface> {
        let surface = self.surface.take();
        if let Some(surface) = &surface {
            debug!("Surface {} destroyed", surface.id);
        }
        surface
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.surface.is_some()
    }
}
