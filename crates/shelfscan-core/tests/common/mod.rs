#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shelfscan_core::acquire::CameraCapture;
use shelfscan_core::clipboard::ClipboardSink;
use shelfscan_core::engine::SymbolEngine;
use shelfscan_core::error::{CameraError, ClipboardError, EngineError};
use shelfscan_core::frame::FrameBuffer;

/// What a fake engine does on every call.
pub enum EngineBehavior {
    /// Always return this code.
    Code(String),
    /// Run fine, find nothing.
    Nothing,
    /// Throw.
    Fail,
}

/// Scriptable engine that counts its invocations.
pub struct FakeEngine {
    name: &'static str,
    behavior: EngineBehavior,
    calls: Arc<AtomicUsize>,
}

impl FakeEngine {
    pub fn boxed(
        name: &'static str,
        behavior: EngineBehavior,
    ) -> (Box<dyn SymbolEngine>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                name,
                behavior,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }
}

impl SymbolEngine for FakeEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn decode(&self, _frame: &FrameBuffer) -> Result<Option<String>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            EngineBehavior::Code(code) => Ok(Some(code.clone())),
            EngineBehavior::Nothing => Ok(None),
            EngineBehavior::Fail => Err(EngineError::Failed {
                name: self.name.to_string(),
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Clipboard fake that records writes, optionally refusing them.
pub struct RecordingClipboard {
    writes: Arc<Mutex<Vec<String>>>,
    deny: bool,
}

impl RecordingClipboard {
    pub fn boxed(deny: bool) -> (Box<dyn ClipboardSink>, Arc<Mutex<Vec<String>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        (
            Box::new(Self {
                writes: Arc::clone(&writes),
                deny,
            }),
            writes,
        )
    }
}

impl ClipboardSink for RecordingClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.deny {
            return Err(ClipboardError("access denied".to_string()));
        }
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// One scripted camera tick.
pub enum CameraStep {
    /// A full frame is buffered.
    Frame(FrameBuffer),
    /// Stream not ready this tick.
    NotReady,
}

/// What the camera does once the script runs out.
pub enum AfterScript {
    /// Keep reporting "not ready".
    NotReady,
    /// Fail the stream.
    Fail,
}

/// Scriptable capture device with start/stop accounting.
pub struct ScriptedCamera {
    steps: VecDeque<CameraStep>,
    after: AfterScript,
    deny_start: bool,
    pub started: Arc<AtomicUsize>,
    pub stopped: Arc<AtomicUsize>,
}

impl ScriptedCamera {
    pub fn new(steps: Vec<CameraStep>, after: AfterScript) -> Self {
        Self {
            steps: steps.into(),
            after,
            deny_start: false,
            started: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denying() -> Self {
        let mut cam = Self::new(Vec::new(), AfterScript::NotReady);
        cam.deny_start = true;
        cam
    }
}

impl CameraCapture for ScriptedCamera {
    fn start(&mut self) -> Result<(), CameraError> {
        if self.deny_start {
            return Err(CameraError::AccessDenied("scripted denial".to_string()));
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }

    fn try_frame(&mut self) -> Result<Option<FrameBuffer>, CameraError> {
        match self.steps.pop_front() {
            Some(CameraStep::Frame(frame)) => Ok(Some(frame)),
            Some(CameraStep::NotReady) => Ok(None),
            None => match self.after {
                AfterScript::NotReady => Ok(None),
                AfterScript::Fail => Err(CameraError::StreamFailed("scripted failure".to_string())),
            },
        }
    }
}
