use super::keyboard::KeyboardInputHandler;
use super::{ActivityStats, CameraActivity, LifecycleEvent, ShutdownReason};
use crate::camera::CameraProvider;
use crate::config::CampreviewConfig;
use crate::error::{CampreviewError, Result};
use crate::events::{EventBus, PreviewEvent};
use crate::surface::Surface;
use crossbeam::channel::{self, Sender};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, warn};

/// How the application is driven
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Listen for shutter/rotate/pause keys on the terminal
    pub keyboard: bool,
    /// Take this many pictures once preview is running, then exit
    pub snap: Option<u32>,
}

/// Callbacks raised when the application window comes up, in platform order
pub fn startup_sequence(config: &CampreviewConfig) -> Vec<LifecycleEvent> {
    let (width, height) = config.display.surface_size;
    vec![
        LifecycleEvent::Create,
        LifecycleEvent::Resume,
        LifecycleEvent::SurfaceCreated(Surface::new(
            config.display.surface_sink.clone(),
            width,
            height,
        )),
        LifecycleEvent::SurfaceChanged {
            format: 0,
            width,
            height,
        },
    ]
}

/// Callbacks raised when the application goes away
pub fn shutdown_sequence() -> Vec<LifecycleEvent> {
    vec![
        LifecycleEvent::Pause,
        LifecycleEvent::SurfaceDestroyed,
        LifecycleEvent::Quit,
    ]
}

/// Counts shutter results for `--snap`
#[derive(Debug, Default)]
pub(crate) struct SnapTracker {
    requested: Option<u32>,
    triggered: bool,
    finished: u32,
    unavailable: Option<String>,
}

impl SnapTracker {
    pub(crate) fn new(requested: Option<u32>) -> Self {
        Self {
            requested,
            triggered: false,
            finished: 0,
            unavailable: None,
        }
    }

    /// Returns the number of shutter presses to issue in response to `event`
    pub(crate) fn observe(&mut self, event: &PreviewEvent) -> u32 {
        match (event, self.requested) {
            (PreviewEvent::PreviewStarted { .. }, Some(shots)) if !self.triggered => {
                self.triggered = true;
                shots
            }
            (PreviewEvent::PictureSaved { .. } | PreviewEvent::CaptureFailed { .. }, _)
                if self.triggered =>
            {
                self.finished += 1;
                0
            }
            (PreviewEvent::CameraUnavailable { reason, .. }, Some(_)) if !self.triggered => {
                self.unavailable = Some(reason.clone());
                0
            }
            _ => 0,
        }
    }

    /// Why the pictures can never be taken, if preview never got going
    pub(crate) fn unavailable(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    pub(crate) fn is_complete(&self) -> bool {
        matches!(self.requested, Some(shots) if self.triggered && self.finished >= shots)
    }
}

fn send_all(lifecycle: &Sender<LifecycleEvent>, events: Vec<LifecycleEvent>) {
    for event in events {
        if lifecycle.send(event).is_err() {
            debug!("Activity loop already finished");
            return;
        }
    }
}

/// Run the activity until a signal, a quit key, or the requested captures end it
pub async fn run(
    config: CampreviewConfig,
    provider: Arc<dyn CameraProvider>,
    options: RunOptions,
) -> Result<ActivityStats> {
    info!("Campreview is running");

    let events = EventBus::new(config.system.event_bus_capacity);
    let mut event_receiver = events.subscribe();
    let (lifecycle, lifecycle_receiver) = channel::unbounded();

    let activity = CameraActivity::new(config.clone(), provider, events.clone());
    let mut activity_task =
        tokio::task::spawn_blocking(move || activity.run(lifecycle_receiver));

    send_all(&lifecycle, startup_sequence(&config));

    let keyboard = if options.keyboard {
        let handler = KeyboardInputHandler::new(lifecycle.clone());
        handler.start().await?;
        Some(handler)
    } else {
        None
    };

    let (shutdown_sender, mut shutdown_receiver) = oneshot::channel();
    setup_signal_handlers(shutdown_sender).await;

    let mut snap = SnapTracker::new(options.snap);
    let mut finished = None;

    let reason = loop {
        tokio::select! {
            reason = &mut shutdown_receiver => {
                break reason.unwrap_or_else(|_| {
                    ShutdownReason::Error("Shutdown channel closed unexpectedly".to_string())
                });
            }
            joined = &mut activity_task => {
                finished = Some(joined);
                break ShutdownReason::UserRequest;
            }
            event = event_receiver.recv() => match event {
                Ok(event) => {
                    if let PreviewEvent::PictureSaved { path, .. } = &event {
                        println!("{}", path.display());
                    }
                    let shots = snap.observe(&event);
                    if shots > 0 {
                        info!("Preview running; taking {} picture(s)", shots);
                        send_all(&lifecycle, vec![LifecycleEvent::Shutter; shots as usize]);
                    }
                    if snap.is_complete() {
                        break ShutdownReason::CapturesComplete;
                    }
                    if let Some(reason) = snap.unavailable() {
                        error!("Cannot take pictures: {}", reason);
                        break ShutdownReason::Error(reason.to_string());
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Preview event listener lagged by {} events; continuing", skipped);
                }
                Err(RecvError::Closed) => {
                    break ShutdownReason::Error("Preview event bus closed".to_string());
                }
            }
        }
    };

    info!("Shutdown initiated: {:?}", reason);

    if let Some(keyboard) = &keyboard {
        if let Err(e) = keyboard.stop().await {
            error!("Error stopping keyboard: {}", e);
        }
    }

    let joined = match finished {
        Some(joined) => joined,
        None => {
            send_all(&lifecycle, shutdown_sequence());
            drop(lifecycle);
            activity_task.await
        }
    };

    let stats = joined.map_err(|e| CampreviewError::System {
        message: format!("Activity thread failed: {}", e),
    })?;

    info!("Campreview shutdown complete");
    Ok(stats)
}

/// Set up signal handlers for graceful shutdown
async fn setup_signal_handlers(shutdown_sender: oneshot::Sender<ShutdownReason>) {
    let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

    // Handle SIGTERM - Unix only
    #[cfg(unix)]
    {
        let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!("Failed to register SIGTERM handler: {}", e);
                    return;
                }
            };
            if sigterm.recv().await.is_some() {
                info!("Received SIGTERM signal");
                if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                }
            }
        });
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
            }
        }
    });
}
