//! Frame acquisition: every input source normalized to a [`FrameBuffer`].
//!
//! Still images (uploaded bytes, pasted/dropped files, base64 `data:` URLs)
//! decode fully before sampling. Live camera frames come through the
//! [`CameraCapture`] trait, which only yields a frame once the underlying
//! stream has buffered a complete one; "not ready" is a silent skip, not an
//! error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{AcquisitionError, CameraError};
use crate::frame::FrameBuffer;

/// Decode a still image from raw encoded bytes (PNG, JPEG, ...).
pub fn from_image_bytes(bytes: &[u8]) -> Result<FrameBuffer, AcquisitionError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();
    let (w, h) = rgba.dimensions();
    FrameBuffer::from_rgba(w as usize, h as usize, rgba.into_raw())
}

/// Decode a base64 image `data:` URL (`data:image/png;base64,...`).
pub fn from_data_url(url: &str) -> Result<FrameBuffer, AcquisitionError> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, b64)| b64)
        .ok_or(AcquisitionError::MalformedDataUrl)?;
    let bytes = STANDARD.decode(payload.trim())?;
    from_image_bytes(&bytes)
}

/// Platform camera/media-capture capability.
///
/// Implementations wrap whatever the host platform offers (a media stream
/// bound to a video sink, a V4L2 device, a test fixture). The session layer
/// drives the lifecycle and polls `try_frame` on its tick.
pub trait CameraCapture: Send {
    /// Acquire the stream and start delivering frames.
    fn start(&mut self) -> Result<(), CameraError>;

    /// Stop the stream and release the device.
    ///
    /// Must be idempotent: calling it on a stopped capture is a no-op.
    fn stop(&mut self);

    /// Grab the current frame.
    ///
    /// Returns `Ok(None)` until a full frame is buffered; the caller skips
    /// that tick silently. `Err` is a terminal stream failure.
    fn try_frame(&mut self) -> Result<Option<FrameBuffer>, CameraError>;
}
