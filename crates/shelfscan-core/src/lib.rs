//! Layered barcode/QR detection pipeline.
//!
//! Given a still image or a live camera frame, produce a single validated
//! code string through a fail-over sequence of decoding strategies:
//!
//! 1. **Primary engine**: the host's main barcode/QR decoder, always tried
//!    first (lowest false-positive rate).
//! 2. **Fallback engine**: the host's secondary scanner, tried only when
//!    the primary produced nothing usable.
//! 3. **Heuristic on the contrast-stretched buffer**: the from-scratch
//!    scanline decoder in [`pattern`], fed a percentile-stretched frame.
//! 4. **Heuristic on the raw buffer**: only when the stretched pass found
//!    no guard pattern at all.
//!
//! The first stage whose output passes the [`validate::ValidationPolicy`]
//! wins; everything after it is skipped. Stage failures are caught locally
//! and logged; the only user-visible "failure" is the normal empty result
//! after all four stages come up dry.
//!
//! # Example
//!
//! ```
//! use shelfscan_core::{config::PipelineConfig, Orchestrator};
//!
//! let orchestrator = Orchestrator::with_config(PipelineConfig::default());
//! // No engines injected: only the heuristic stages run.
//! let frame = shelfscan_core::test_utils::render_bar_pattern("174174174174", 20, 60, 0.0);
//! let candidate = orchestrator.detect(&frame);
//! assert!(candidate.is_some());
//! ```

/// Frame acquisition from bytes, data URLs, and live capture.
pub mod acquire;
/// Platform clipboard seam.
pub mod clipboard;
/// Pipeline and heuristic configuration.
pub mod config;
/// External decoding engine seam.
pub mod engine;
/// Error taxonomy.
pub mod error;
/// Owned RGBA pixel buffer.
pub mod frame;
/// Heuristic scanline decoder.
pub mod pattern;
/// Smoothing and contrast preprocessing.
pub mod preprocess;
/// Live-scan session state machine.
pub mod session;
/// Synthetic test scenes.
pub mod test_utils;
/// Candidate acceptance policy.
pub mod validate;

use std::time::Instant;

pub use crate::config::PipelineConfig;
pub use crate::frame::FrameBuffer;
pub use crate::session::{ScanSession, SessionState};
pub use crate::validate::ValidationPolicy;

use crate::clipboard::ClipboardSink;
use crate::engine::SymbolEngine;
use crate::pattern::{ScanOrientation, ScanOutcome};

/// Human-readable message for the normal "nothing detected" outcome.
pub const NO_CODE_MESSAGE: &str = "No machine-readable code was found in the image.";

/// The decoding stage that produced a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectMethod {
    /// The injected primary engine.
    PrimaryEngine,
    /// The injected fallback engine.
    FallbackEngine,
    /// Heuristic decoder, bars crossing horizontal scanlines.
    HeuristicHorizontal,
    /// Heuristic decoder, bars found after 90-degree rotation.
    HeuristicVertical,
}

impl DetectMethod {
    /// Stable string tag for host callbacks and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DetectMethod::PrimaryEngine => "primary_engine",
            DetectMethod::FallbackEngine => "fallback_engine",
            DetectMethod::HeuristicHorizontal => "heuristic_horizontal",
            DetectMethod::HeuristicVertical => "heuristic_vertical",
        }
    }
}

impl From<ScanOrientation> for DetectMethod {
    fn from(orientation: ScanOrientation) -> Self {
        match orientation {
            ScanOrientation::Horizontal => DetectMethod::HeuristicHorizontal,
            ScanOrientation::Vertical => DetectMethod::HeuristicVertical,
        }
    }
}

/// One validated detection. At most one is produced per orchestrator call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionCandidate {
    /// The accepted code string.
    pub code: String,
    /// The stage that produced it.
    pub method: DetectMethod,
}

/// Stage timings and counters for a single detection call.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineStats {
    /// Time spent in the primary engine, milliseconds.
    pub primary_ms: f64,
    /// Time spent in the fallback engine, milliseconds.
    pub fallback_ms: f64,
    /// Time spent in the heuristic stages (both buffers), milliseconds.
    pub heuristic_ms: f64,
    /// Total pipeline time, milliseconds.
    pub total_ms: f64,
    /// Candidates that decoded but failed the validation policy.
    pub rejected_by_validation: usize,
}

/// Full result of a detection call, including debug data.
#[derive(Clone, Debug, Default)]
pub struct FullScanResult {
    /// The accepted candidate, if any stage produced one.
    pub candidate: Option<DetectionCandidate>,
    /// The heuristic's raw-bits diagnostic when no guard pattern was found.
    pub raw_diagnostic: Option<String>,
    /// Stage timings and counters.
    pub stats: PipelineStats,
}

impl FullScanResult {
    fn new() -> Self {
        Self::default()
    }
}

/// The detection orchestrator.
///
/// Owns the pipeline configuration and the injected collaborators (engines,
/// clipboard). Immutable while detecting, so one instance can be shared
/// behind an `Arc` between a UI thread and a live-scan session.
pub struct Orchestrator {
    config: PipelineConfig,
    primary: Option<Box<dyn SymbolEngine>>,
    fallback: Option<Box<dyn SymbolEngine>>,
    clipboard: Option<Box<dyn ClipboardSink>>,
}

impl Orchestrator {
    /// Create an orchestrator with default configuration and no engines.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create an orchestrator with custom configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            primary: None,
            fallback: None,
            clipboard: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Inject the primary external engine.
    pub fn set_primary_engine(&mut self, engine: Box<dyn SymbolEngine>) {
        self.primary = Some(engine);
    }

    /// Inject the fallback external engine.
    pub fn set_fallback_engine(&mut self, engine: Box<dyn SymbolEngine>) {
        self.fallback = Some(engine);
    }

    /// Inject the platform clipboard sink for the copy-on-success side
    /// effect.
    pub fn set_clipboard(&mut self, sink: Box<dyn ClipboardSink>) {
        self.clipboard = Some(sink);
    }

    /// Run the stage sequence and return the first validated candidate.
    ///
    /// `None` is the normal "no code found" outcome (see
    /// [`NO_CODE_MESSAGE`]), never an error.
    #[must_use]
    pub fn detect(&self, frame: &FrameBuffer) -> Option<DetectionCandidate> {
        self.detect_full(frame).candidate
    }

    /// Detection with stage timings.
    #[must_use]
    pub fn detect_with_stats(&self, frame: &FrameBuffer) -> (Option<DetectionCandidate>, PipelineStats) {
        let res = self.detect_full(frame);
        (res.candidate, res.stats)
    }

    /// Detection with all intermediate debug data.
    #[must_use]
    pub fn detect_full(&self, frame: &FrameBuffer) -> FullScanResult {
        let start_total = Instant::now();
        let mut res = FullScanResult::new();

        // Stage 1: primary engine, always attempted first.
        if let Some(engine) = &self.primary {
            let _span = tracing::info_span!("primary_engine", name = engine.name()).entered();
            let start = Instant::now();
            let outcome = self.run_engine(engine.as_ref(), frame, DetectMethod::PrimaryEngine, &mut res.stats);
            res.stats.primary_ms = start.elapsed().as_secs_f64() * 1000.0;
            if outcome.is_some() {
                res.candidate = outcome;
                res.stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;
                return res;
            }
        }

        // Stage 2: fallback engine, optionally held back by the configured
        // delay to keep stage 1's priority unambiguous.
        if let Some(engine) = &self.fallback {
            let _span = tracing::info_span!("fallback_engine", name = engine.name()).entered();
            if !self.config.fallback_delay.is_zero() {
                std::thread::sleep(self.config.fallback_delay);
            }
            let start = Instant::now();
            let outcome = self.run_engine(engine.as_ref(), frame, DetectMethod::FallbackEngine, &mut res.stats);
            res.stats.fallback_ms = start.elapsed().as_secs_f64() * 1000.0;
            if outcome.is_some() {
                res.candidate = outcome;
                res.stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;
                return res;
            }
        }

        // Stages 3 and 4: heuristic decoder, stretched buffer first, raw
        // buffer only when the stretched pass saw no guard pattern.
        {
            let _span = tracing::info_span!("heuristic").entered();
            let start = Instant::now();
            let stretched = preprocess::contrast_stretch(frame);
            let outcome = match pattern::scan(&stretched, &self.config.heuristic) {
                ScanOutcome::Digits { code, orientation } => {
                    self.accept(code, orientation.into(), &mut res.stats)
                }
                ScanOutcome::Diagnostic { bits } => {
                    tracing::debug!(bits = %bits, "no guard pattern on stretched buffer");
                    res.raw_diagnostic = Some(bits);
                    match pattern::scan(frame, &self.config.heuristic) {
                        ScanOutcome::Digits { code, orientation } => {
                            self.accept(code, orientation.into(), &mut res.stats)
                        }
                        ScanOutcome::Diagnostic { bits } => {
                            tracing::debug!(bits = %bits, "no guard pattern on raw buffer");
                            res.raw_diagnostic = Some(bits);
                            None
                        }
                    }
                }
            };
            res.stats.heuristic_ms = start.elapsed().as_secs_f64() * 1000.0;
            res.candidate = outcome;
        }

        res.stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;
        if res.candidate.is_none() {
            tracing::debug!("all stages exhausted, no code found");
        }
        res
    }

    /// Run one external engine stage; any failure is downgraded to "no
    /// result".
    fn run_engine(
        &self,
        engine: &dyn SymbolEngine,
        frame: &FrameBuffer,
        method: DetectMethod,
        stats: &mut PipelineStats,
    ) -> Option<DetectionCandidate> {
        match engine.decode(frame) {
            Ok(Some(code)) => self.accept(code, method, stats),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(engine = engine.name(), error = %err, "engine stage failed");
                None
            }
        }
    }

    /// Validate a decoded string and, on acceptance, perform the clipboard
    /// side effect.
    fn accept(
        &self,
        code: String,
        method: DetectMethod,
        stats: &mut PipelineStats,
    ) -> Option<DetectionCandidate> {
        if code.is_empty() {
            return None;
        }
        if !self.config.validation.accepts(&code) {
            stats.rejected_by_validation += 1;
            tracing::debug!(method = method.as_str(), len = code.len(), "candidate rejected by validation");
            return None;
        }
        if let Some(sink) = &self.clipboard {
            // Best effort only: a denied clipboard must not fail detection.
            if let Err(err) = sink.write_text(&code) {
                tracing::debug!(error = %err, "clipboard copy skipped");
            }
        }
        tracing::info!(method = method.as_str(), "code detected");
        Some(DetectionCandidate { code, method })
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
