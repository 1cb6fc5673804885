//! Basic pattern decoder: best-guess digit extraction from degraded frames.
//!
//! This is the dependency-free fallback used when both external engines come
//! up empty. It makes no attempt at conformant symbol decoding; it smooths
//! the frame, binarizes a band of scanlines against per-line adaptive
//! thresholds, votes for the modal bar sequence, and maps guard-delimited
//! payload segments to digits by dark-bit density. Results carry the
//! [`HEURISTIC_DIGITS_PREFIX`] tag so consumers can treat them as
//! lower-confidence than an engine decode.

use crate::config::HeuristicConfig;
use crate::frame::FrameBuffer;
use crate::preprocess;

/// Tag prefixed to the 12-digit best-guess string.
pub const HEURISTIC_DIGITS_PREFIX: &str = "BASIC_EAN_DIGITS_";

/// Tag prefixed to the raw-bits diagnostic. Always rejected by the
/// validation filter; exists to aid debugging of detection failures.
pub const RAW_BITS_PREFIX: &str = "BASIC_RAW_BITS_";

/// Start/end marker approximating an EAN/UPC guard.
const GUARD: &str = "101";

/// Scan direction that produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOrientation {
    /// Bars crossed the sampled horizontal scanlines directly.
    Horizontal,
    /// Bars were only found after rotating the buffer 90 degrees.
    Vertical,
}

/// Outcome of one heuristic pass over a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A guard-delimited payload was found and mapped to twelve digits.
    Digits {
        /// `BASIC_EAN_DIGITS_` followed by twelve digits.
        code: String,
        /// Which scan direction matched.
        orientation: ScanOrientation,
    },
    /// No guard pattern in either orientation.
    Diagnostic {
        /// `BASIC_RAW_BITS_` followed by the truncated modal bar sequence.
        bits: String,
    },
}

/// Run the full heuristic over a frame: smooth, scan horizontally, retry on
/// the rotated buffer, and fall back to the raw-bits diagnostic.
///
/// Never fails: uniform or degenerate frames produce a [`ScanOutcome::Diagnostic`].
#[must_use]
pub fn scan(frame: &FrameBuffer, config: &HeuristicConfig) -> ScanOutcome {
    let smoothed = preprocess::smooth(frame);

    let horizontal = representative_bits(&smoothed, config);
    if let Some(digits) = decode_bits(&horizontal, config) {
        return ScanOutcome::Digits {
            code: format!("{HEURISTIC_DIGITS_PREFIX}{digits}"),
            orientation: ScanOrientation::Horizontal,
        };
    }

    let rotated = smoothed.rotate90();
    let vertical = representative_bits(&rotated, config);
    if let Some(digits) = decode_bits(&vertical, config) {
        return ScanOutcome::Digits {
            code: format!("{HEURISTIC_DIGITS_PREFIX}{digits}"),
            orientation: ScanOrientation::Vertical,
        };
    }

    let mut bits = horizontal;
    bits.truncate(config.raw_diagnostic_limit);
    ScanOutcome::Diagnostic {
        bits: format!("{RAW_BITS_PREFIX}{bits}"),
    }
}

/// Sample the configured scanline band and return the modal binarized line.
///
/// Barcodes produce a near-identical binary signature across adjacent
/// scanlines, so the modal string filters out lines that crossed text,
/// shadows, or other artifacts.
fn representative_bits(frame: &FrameBuffer, config: &HeuristicConfig) -> String {
    let h = frame.height();
    let count = config.scanline_count.max(1);
    let span = config.band_end - config.band_start;

    let mut tally: Vec<(String, usize)> = Vec::new();
    for i in 0..count {
        let t = if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            0.5
        };
        let y = ((config.band_start + span * t) * h as f32) as usize;
        let line = binarize_line(frame, y.min(h - 1));
        match tally.iter_mut().find(|(s, _)| *s == line) {
            Some((_, n)) => *n += 1,
            None => tally.push((line, 1)),
        }
    }

    // Strict `>` keeps the earliest-seen string on ties.
    let mut best: Option<(String, usize)> = None;
    for (line, n) in tally {
        if best.as_ref().map_or(true, |(_, bn)| n > *bn) {
            best = Some((line, n));
        }
    }
    best.map(|(line, _)| line).unwrap_or_default()
}

/// Binarize one scanline against its own mean luminance.
///
/// `'1'` marks a pixel darker than the line mean (a bar), `'0'` a lighter
/// one (a space).
fn binarize_line(frame: &FrameBuffer, y: usize) -> String {
    let w = frame.width();
    let mut sum = 0.0f64;
    for x in 0..w {
        sum += f64::from(frame.luminance(x, y));
    }
    let mean = sum / w as f64;

    let mut bits = String::with_capacity(w);
    for x in 0..w {
        bits.push(if f64::from(frame.luminance(x, y)) < mean {
            '1'
        } else {
            '0'
        });
    }
    bits
}

/// Locate the outermost guard patterns and map the payload to twelve digits.
///
/// Returns `None` when no guard pair far enough apart exists.
fn decode_bits(bits: &str, config: &HeuristicConfig) -> Option<String> {
    let first = bits.find(GUARD)?;
    let last = bits.rfind(GUARD)?;
    if last - first < config.guard_min_span {
        return None;
    }

    let payload = &bits.as_bytes()[first + GUARD.len()..last];
    if payload.len() < 12 {
        return None;
    }

    let mut digits = String::with_capacity(12);
    for seg in 0..12 {
        let a = seg * payload.len() / 12;
        let b = (seg + 1) * payload.len() / 12;
        let ones = payload[a..b].iter().filter(|&&c| c == b'1').count();
        let frac = ones as f32 / (b - a) as f32;
        digits.push(map_digit(frac, config));
    }
    Some(digits)
}

/// Map a segment's dark-bit fraction to a digit.
///
/// The cutoffs are empirically chosen; their exact values define the
/// heuristic's behavior and come straight from configuration.
fn map_digit(frac: f32, c: &HeuristicConfig) -> char {
    if frac > c.digit_one_min {
        '1'
    } else if frac < c.digit_zero_max {
        '0'
    } else if frac > c.digit_seven_min {
        '7'
    } else if frac > c.digit_four_min {
        '4'
    } else if frac > c.digit_three_min {
        '3'
    } else {
        '2'
    }
}
