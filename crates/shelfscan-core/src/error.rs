//! Error taxonomy for the detection pipeline.
//!
//! Every stage failure inside the orchestrator is local and non-fatal: engine
//! errors are caught, logged, and treated as "stage produced nothing". The
//! only terminal failure mode of a live session is [`CameraError`]. A decoded
//! string that fails validation is *not* an error: it is counted in the
//! pipeline stats and the pipeline moves on.

use thiserror::Error;

/// Failure to turn an input source into a pixel buffer.
///
/// Aborts the current attempt (one frame, one upload), never the session.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The image bytes could not be decoded.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    /// A `data:` URL was missing the base64 image payload.
    #[error("not a base64 image data url")]
    MalformedDataUrl,
    /// The base64 payload of a `data:` URL could not be decoded.
    #[error("base64 payload invalid: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded image has a zero dimension.
    #[error("decoded image has empty dimensions ({width}x{height})")]
    EmptyFrame {
        /// Decoded width in pixels.
        width: usize,
        /// Decoded height in pixels.
        height: usize,
    },
    /// A raw sample buffer does not match the declared RGBA dimensions.
    #[error("buffer of {len} bytes does not hold a {width}x{height} rgba image")]
    SizeMismatch {
        /// Declared width in pixels.
        width: usize,
        /// Declared height in pixels.
        height: usize,
        /// Actual buffer length in bytes.
        len: usize,
    },
}

/// An external decoding engine threw or returned malformed data.
///
/// Caught at the stage boundary and downgraded to "no result".
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine call itself failed.
    #[error("engine {name} failed: {message}")]
    Failed {
        /// Engine name, as reported by [`crate::engine::SymbolEngine::name`].
        name: String,
        /// Host-provided failure detail.
        message: String,
    },
    /// The engine returned data the adapter could not interpret.
    #[error("engine {name} returned malformed output: {message}")]
    Malformed {
        /// Engine name.
        name: String,
        /// What was wrong with the output.
        message: String,
    },
}

/// Camera stream acquisition or runtime failure.
///
/// Terminal for the current scan session; requires an explicit restart.
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// The platform refused access to the capture device.
    #[error("camera access denied: {0}")]
    AccessDenied(String),
    /// The stream was live and then failed.
    #[error("camera stream failed: {0}")]
    StreamFailed(String),
}

/// Best-effort clipboard write failure. Logged and dropped by the pipeline.
#[derive(Debug, Error)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);
