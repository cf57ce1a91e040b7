use super::LifecycleEvent;
use crate::error::Result;
use crossbeam::channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Maps a key press to the lifecycle events it stands for
pub(crate) fn events_for_key(code: KeyCode, paused: &mut bool) -> Vec<LifecycleEvent> {
    match code {
        KeyCode::Char(' ') => vec![LifecycleEvent::Shutter],
        KeyCode::Char('r') => vec![LifecycleEvent::RotateClockwise],
        KeyCode::Char('p') => {
            *paused = !*paused;
            if *paused {
                vec![LifecycleEvent::Pause]
            } else {
                vec![LifecycleEvent::Resume]
            }
        }
        KeyCode::Char('q') | KeyCode::Esc => vec![
            LifecycleEvent::Pause,
            LifecycleEvent::SurfaceDestroyed,
            LifecycleEvent::Quit,
        ],
        _ => Vec::new(),
    }
}

/// Keyboard shutter and lifecycle controls for the terminal
pub struct KeyboardInputHandler {
    lifecycle: Sender<LifecycleEvent>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(lifecycle: Sender<LifecycleEvent>) -> Self {
        Self {
            lifecycle,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Keyboard controls: SPACE = shutter, r = rotate, p = pause/resume, q = quit");

        let lifecycle = self.lifecycle.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            let mut paused = false;
            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => {
                            let events = events_for_key(key_event.code, &mut paused);
                            if events.is_empty() {
                                debug!("Key pressed: {:?}", key_event.code);
                            }

                            let quitting = events.contains(&LifecycleEvent::Quit);
                            for event in events {
                                if lifecycle.send(event).is_err() {
                                    debug!("Activity is gone; keyboard handler exiting");
                                    break;
                                }
                            }
                            if quitting {
                                info!("Quit key pressed");
                                break;
                            }
                        }
                        Ok(Event::Resize(width, height)) => {
                            let _ = lifecycle.send(LifecycleEvent::SurfaceChanged {
                                format: 0,
                                width: width as u32,
                                height: height as u32,
                            });
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Error reading keyboard event: {}", e),
                    },
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to leave raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}
