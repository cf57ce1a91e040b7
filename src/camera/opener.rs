use super::device::{CameraDevice, CameraProvider, CameraResult};
use crate::config::WorkerConfig;
use crate::error::CameraError;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where the blocking device-open call runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStrategy {
    /// Open on the calling thread
    Direct,
    /// Open on a dedicated background thread, waiting at most `timeout`
    Worker { timeout: Duration },
}

impl From<&WorkerConfig> for OpenStrategy {
    fn from(config: &WorkerConfig) -> Self {
        if config.enabled {
            OpenStrategy::Worker {
                timeout: Duration::from_millis(config.open_timeout_ms),
            }
        } else {
            OpenStrategy::Direct
        }
    }
}

struct OpenRequest {
    index: u32,
    reply: Sender<CameraResult<Box<dyn CameraDevice>>>,
}

/// Opens camera devices, optionally through a single background thread.
///
/// The thread is spawned on first use and serves requests until the opener is
/// dropped. Only one request may be outstanding at a time.
pub struct CameraOpener {
    provider: Arc<dyn CameraProvider>,
    strategy: OpenStrategy,
    requests: Option<Sender<OpenRequest>>,
    in_flight: Arc<AtomicBool>,
}

impl CameraOpener {
    pub fn new(provider: Arc<dyn CameraProvider>, strategy: OpenStrategy) -> Self {
        Self {
            provider,
            strategy,
            requests: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the background thread has been started
    pub fn has_worker(&self) -> bool {
        self.requests.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Open camera `index`, blocking the caller until the device is ready or the open fails
    pub fn open(&mut self, index: u32) -> CameraResult<Box<dyn CameraDevice>> {
        match self.strategy {
            OpenStrategy::Direct => {
                debug!("Opening camera {} on the calling thread", index);
                self.provider.open(index)
            }
            OpenStrategy::Worker { timeout } => self.open_on_worker(index, timeout),
        }
    }

    fn open_on_worker(
        &mut self,
        index: u32,
        timeout: Duration,
    ) -> CameraResult<Box<dyn CameraDevice>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Camera open requested while a previous open is still running");
            return Err(CameraError::OpenInFlight);
        }

        let requests = match self.worker() {
            Ok(requests) => requests,
            Err(e) => {
                self.in_flight.store(false, Ordering::Release);
                return Err(e);
            }
        };

        let (reply, response) = channel::bounded(1);
        if requests.send(OpenRequest { index, reply }).is_err() {
            self.in_flight.store(false, Ordering::Release);
            self.requests = None;
            return Err(CameraError::WorkerUnavailable);
        }

        debug!("Waiting up to {:?} for camera {} to open", timeout, index);
        match response.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                error!("Camera {} did not open within {:?}", index, timeout);
                Err(CameraError::OpenTimeout { timeout })
            }
            Err(RecvTimeoutError::Disconnected) => {
                error!("Camera opener thread exited while opening camera {}", index);
                self.in_flight.store(false, Ordering::Release);
                self.requests = None;
                Err(CameraError::WorkerUnavailable)
            }
        }
    }

    fn worker(&mut self) -> CameraResult<Sender<OpenRequest>> {
        if let Some(requests) = &self.requests {
            return Ok(requests.clone());
        }

        let (requests, incoming) = channel::bounded::<OpenRequest>(1);
        let provider = Arc::clone(&self.provider);
        let in_flight = Arc::clone(&self.in_flight);

        thread::Builder::new()
            .name("camera-opener".to_string())
            .spawn(move || {
                debug!("Camera opener thread started");
                for request in incoming.iter() {
                    let result = provider.open(request.index);
                    in_flight.store(false, Ordering::Release);

                    // The caller gave up waiting; do not leak a late device
                    if let Err(channel::SendError(Ok(mut device))) = request.reply.send(result) {
                        warn!(
                            "Camera {} opened after the caller timed out; releasing it",
                            request.index
                        );
                        device.release();
                    }
                }
                debug!("Camera opener thread exiting");
            })
            .map_err(|e| CameraError::operation("spawn_opener", e.to_string()))?;

        info!("Started camera opener thread");
        self.requests = Some(requests.clone());
        Ok(requests)
    }
}
