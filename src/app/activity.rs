use super::{ActivityStats, LifecycleEvent};
use crate::camera::{CameraOpener, CameraProvider, OpenStrategy};
use crate::capture::{CaptureOutcome, PictureStore};
use crate::config::CampreviewConfig;
use crate::events::EventBus;
use crate::preview::PreviewView;
use crossbeam::channel::Receiver;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the preview view and maps lifecycle callbacks onto it.
///
/// Runs on a single thread; every callback is handled to completion before the next.
pub struct CameraActivity {
    config: CampreviewConfig,
    provider: Arc<dyn CameraProvider>,
    events: EventBus,
    preview: Option<PreviewView>,
    preview_shown: bool,
    stats: ActivityStats,
}

impl CameraActivity {
    pub fn new(
        config: CampreviewConfig,
        provider: Arc<dyn CameraProvider>,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            provider,
            events,
            preview: None,
            preview_shown: false,
            stats: ActivityStats::default(),
        }
    }

    pub fn preview(&self) -> Option<&PreviewView> {
        self.preview.as_ref()
    }

    pub fn is_preview_shown(&self) -> bool {
        self.preview_shown
    }

    pub fn stats(&self) -> ActivityStats {
        self.stats
    }

    /// Build the preview view and put it on screen
    pub fn on_create(&mut self) {
        if self.preview.is_some() {
            warn!("Activity created twice; keeping the existing preview");
            return;
        }

        let opener = CameraOpener::new(
            Arc::clone(&self.provider),
            OpenStrategy::from(&self.config.worker),
        );
        let store = self
            .config
            .capture
            .enabled
            .then(|| PictureStore::new(&self.config.capture));
        if let Some(store) = &store {
            info!("Pictures will be saved to {}", store.directory().display());
        }

        let mut preview = PreviewView::new(
            self.config.camera.index,
            opener,
            self.config.display.rotation,
            store,
        )
        .with_events(self.events.clone());
        preview.attach_camera();

        self.preview = Some(preview);
        self.preview_shown = true;
        info!(
            "Activity created (camera backend {})",
            self.provider.name()
        );
    }

    pub fn on_resume(&mut self) {
        info!("Activity resumed");
        if let Some(preview) = self.preview.as_mut() {
            preview.attach_camera();
            preview.start_preview();
        }
    }

    pub fn on_pause(&mut self) {
        info!("Activity paused");
        self.preview_shown = false;
        if let Some(preview) = self.preview.as_mut() {
            preview.release();
        }
    }

    pub fn on_destroy(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            info!("Activity destroyed");
            preview.release();
        }
        self.preview_shown = false;
    }

    /// Dispatch one callback. Breaks once the activity has been torn down.
    pub fn handle(&mut self, event: LifecycleEvent) -> ControlFlow<()> {
        self.stats.events_handled += 1;
        debug!("Lifecycle event: {:?}", event);

        match event {
            LifecycleEvent::Create => self.on_create(),
            LifecycleEvent::Resume => self.on_resume(),
            LifecycleEvent::Pause => self.on_pause(),
            LifecycleEvent::Destroy | LifecycleEvent::Quit => {
                self.on_destroy();
                return ControlFlow::Break(());
            }
            event => {
                let Some(preview) = self.preview.as_mut() else {
                    debug!("Ignoring {:?} before the activity is created", event);
                    return ControlFlow::Continue(());
                };

                match event {
                    LifecycleEvent::SurfaceCreated(surface) => preview.surface_created(surface),
                    LifecycleEvent::SurfaceChanged {
                        format,
                        width,
                        height,
                    } => preview.surface_changed(format, width, height),
                    LifecycleEvent::SurfaceDestroyed => preview.surface_destroyed(),
                    LifecycleEvent::RotationChanged(rotation) => {
                        preview.set_display_rotation(rotation)
                    }
                    LifecycleEvent::RotateClockwise => {
                        let next = preview.display_rotation().next_clockwise();
                        preview.set_display_rotation(next)
                    }
                    LifecycleEvent::Shutter => match preview.capture() {
                        CaptureOutcome::Saved(_) => self.stats.pictures_saved += 1,
                        CaptureOutcome::Skipped if !preview.capture_enabled() => {}
                        _ => self.stats.captures_failed += 1,
                    },
                    _ => {}
                }
            }
        }

        ControlFlow::Continue(())
    }

    /// Handle callbacks until the activity is torn down or the senders go away
    pub fn run(mut self, events: Receiver<LifecycleEvent>) -> ActivityStats {
        info!("Activity loop started");
        for event in events.iter() {
            if self.handle(event).is_break() {
                break;
            }
        }

        self.on_destroy();
        info!("Activity loop finished: {:?}", self.stats);
        self.stats
    }
}
