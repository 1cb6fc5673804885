//! External decoding engine seam.
//!
//! The two production engines (a WASM-compiled barcode library and a classic
//! computer-vision scanner) live outside this crate; the pipeline only cares
//! about their input/output contract. Hosts implement [`SymbolEngine`] for
//! each and inject them into the orchestrator, which also lets the ordering
//! and short-circuit logic be unit-tested with fakes.

use crate::error::EngineError;
use crate::frame::FrameBuffer;

/// A black-box symbol decoder over a pixel buffer.
///
/// Implementations must not panic on malformed frames; any internal failure
/// is reported as an [`EngineError`], which the orchestrator downgrades to
/// "stage produced nothing".
pub trait SymbolEngine: Send + Sync {
    /// Engine name used in logs (e.g. `"wasm-reader"`).
    fn name(&self) -> &str;

    /// Attempt to decode one symbol from the frame.
    ///
    /// `Ok(None)` means the engine ran and found nothing, which is a normal outcome.
    fn decode(&self, frame: &FrameBuffer) -> Result<Option<String>, EngineError>;
}
