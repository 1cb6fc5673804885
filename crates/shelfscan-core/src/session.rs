//! Live-scan session: continuous capture until the first accepted code.
//!
//! A session owns a camera capture, a shared orchestrator, and one timer
//! loop. Each tick grabs a frame (skipping silently while the stream is not
//! ready), runs the full detection pipeline on a blocking worker, and stops
//! itself on the first distinct, validated detection. All per-session state
//! lives on the session object; nothing ambient survives teardown.
//!
//! Teardown is unconditional and idempotent: the timer is cancelled before
//! the capture engine is released, and any decode still in flight when the
//! session stops discards its result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::MissedTickBehavior;

use crate::acquire::CameraCapture;
use crate::error::CameraError;
use crate::{DetectMethod, Orchestrator};

/// Host callback for an accepted detection. Invoked at most once per
/// session.
pub type DetectCallback = Box<dyn Fn(&str, DetectMethod) + Send + Sync>;

/// Host callback for terminal camera failures.
pub type ErrorCallback = Box<dyn Fn(&CameraError) + Send + Sync>;

/// Lifecycle state of a scan session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Not scanning; all resources released.
    Idle,
    /// Stream requested, not yet confirmed live.
    Initializing,
    /// Timer running, frames being sampled.
    Scanning,
    /// A code was accepted and the session stopped itself.
    Detected,
    /// The camera failed; an explicit restart is required.
    Error,
}

/// Per-method memory of the last accepted code.
///
/// A repeated code is only suppressed when both the code and the producing
/// method match, so a slower fallback engine confirming a faster engine's
/// result must not count as a new code.
#[derive(Default)]
struct DedupeMap {
    last: HashMap<DetectMethod, String>,
}

impl DedupeMap {
    /// Record `code` for `method`; returns `false` when it matches the
    /// previous entry for that same method.
    fn is_fresh(&mut self, method: DetectMethod, code: &str) -> bool {
        if self.last.get(&method).is_some_and(|prev| prev.as_str() == code) {
            return false;
        }
        self.last.insert(method, code.to_string());
        true
    }
}

struct SessionShared {
    active: AtomicBool,
    state: Mutex<SessionState>,
    camera: Mutex<Box<dyn CameraCapture>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SessionShared {
    fn set_state(&self, state: SessionState) {
        *self.state.lock().expect("session state lock") = state;
    }

    /// Cancel the timer first, then release the capture engine.
    /// Safe to call from any state, any number of times.
    fn teardown(&self, final_state: SessionState) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().expect("session task lock").take() {
            handle.abort();
        }
        self.camera.lock().expect("session camera lock").stop();
        self.set_state(final_state);
    }
}

/// A running (or finished) live-scan session.
///
/// Construct with [`ScanSession::start`]; the session stops itself on the
/// first accepted detection or camera failure, and can be stopped explicitly
/// at any time with [`ScanSession::stop`]. Dropping the session tears it
/// down as well.
pub struct ScanSession {
    shared: Arc<SessionShared>,
}

impl ScanSession {
    /// Start a live scan.
    ///
    /// Acquires the camera stream and spawns the sampling loop on the
    /// current tokio runtime. A denied camera surfaces as `Err` here;
    /// runtime stream failures surface through `on_error` and
    /// [`SessionState::Error`].
    pub fn start(
        orchestrator: Arc<Orchestrator>,
        camera: Box<dyn CameraCapture>,
        on_detect: DetectCallback,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self, CameraError> {
        let interval = orchestrator.config().scan_interval;

        let shared = Arc::new(SessionShared {
            active: AtomicBool::new(true),
            state: Mutex::new(SessionState::Initializing),
            camera: Mutex::new(camera),
            task: Mutex::new(None),
        });

        // The capture engine confirming the stream is live is what moves the
        // session from Initializing to Scanning.
        {
            let mut cam = shared.camera.lock().expect("session camera lock");
            if let Err(err) = cam.start() {
                cam.stop();
                return Err(err);
            }
        }
        shared.set_state(SessionState::Scanning);

        let loop_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move {
            scan_loop(loop_shared, orchestrator, interval, on_detect, on_error).await;
        });
        *shared.task.lock().expect("session task lock") = Some(handle);

        Ok(Self { shared })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.shared.state.lock().expect("session state lock")
    }

    /// Stop scanning and release the camera and timer.
    ///
    /// Unconditional and idempotent: stopping an already-stopped or idle
    /// session is a no-op.
    pub fn stop(&self) {
        self.shared.teardown(SessionState::Idle);
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.shared.teardown(SessionState::Idle);
    }
}

async fn scan_loop(
    shared: Arc<SessionShared>,
    orchestrator: Arc<Orchestrator>,
    interval: std::time::Duration,
    on_detect: DetectCallback,
    on_error: Option<ErrorCallback>,
) {
    let mut ticker = tokio::time::interval(interval.max(std::time::Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seen = DedupeMap::default();

    loop {
        ticker.tick().await;
        if !shared.active.load(Ordering::SeqCst) {
            return;
        }

        // Camera access never crosses an await: the lock is taken and
        // released within the tick's synchronous section.
        let grabbed = {
            let mut camera = shared.camera.lock().expect("session camera lock");
            camera.try_frame()
        };
        let frame = match grabbed {
            Ok(Some(frame)) => frame,
            // Stream not ready yet: skip this tick silently.
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "camera stream failed, stopping session");
                if shared.active.swap(false, Ordering::SeqCst) {
                    shared.camera.lock().expect("session camera lock").stop();
                    shared.set_state(SessionState::Error);
                    if let Some(cb) = &on_error {
                        cb(&err);
                    }
                }
                return;
            }
        };

        // One decode per tick: the next sample is not taken until this one
        // resolves, bounding memory and serializing clipboard writes.
        let worker = Arc::clone(&orchestrator);
        let outcome = tokio::task::spawn_blocking(move || worker.detect(&frame)).await;

        // A stop request may have landed while the decode was in flight;
        // its result is discarded, not acted on.
        if !shared.active.load(Ordering::SeqCst) {
            return;
        }

        let candidate = match outcome {
            Ok(Some(candidate)) => candidate,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "decode task failed");
                continue;
            }
        };

        if !seen.is_fresh(candidate.method, &candidate.code) {
            tracing::debug!(
                method = candidate.method.as_str(),
                "duplicate detection suppressed"
            );
            continue;
        }

        // First distinct, validated code: stop the timer, release the
        // camera, notify the host exactly once.
        if shared.active.swap(false, Ordering::SeqCst) {
            shared.camera.lock().expect("session camera lock").stop();
            shared.set_state(SessionState::Detected);
            on_detect(&candidate.code, candidate.method);
        }
        return;
    }
}
