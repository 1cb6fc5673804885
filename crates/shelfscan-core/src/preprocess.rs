//! Pixel-level preprocessing ahead of the heuristic decoder.
//!
//! Two transforms live here: a 3x3 weighted-average smoothing pass that the
//! basic pattern decoder runs first to suppress pixel noise, and the
//! histogram contrast stretch the orchestrator applies before handing a
//! frame to the heuristic path. Both produce new buffers; inputs are never
//! mutated.

use multiversion::multiversion;
use rayon::prelude::*;

use crate::frame::{luma, FrameBuffer, CHANNELS};

/// 3x3 smoothing kernel, row-major, divisor 16.
const KERNEL: [u32; 9] = [1, 2, 1, 2, 4, 2, 1, 2, 1];

/// Smooth the frame with a 3x3 weighted-average kernel.
///
/// Operates per RGB channel; alpha and the 1-pixel border keep their
/// original values.
#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
#[must_use]
pub fn smooth(frame: &FrameBuffer) -> FrameBuffer {
    let w = frame.width();
    let h = frame.height();
    let src = frame.data();
    // Seeding the output from the source keeps border pixels and alpha as-is.
    let mut out = src.to_vec();

    if w > 2 && h > 2 {
        let row_bytes = w * CHANNELS;
        out[row_bytes..row_bytes * (h - 1)]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(i, dst_row)| {
                let y = i + 1;
                for x in 1..w - 1 {
                    for c in 0..3 {
                        let mut acc = 0u32;
                        for (k, weight) in KERNEL.iter().enumerate() {
                            let sy = y + k / 3 - 1;
                            let sx = x + k % 3 - 1;
                            acc += weight * u32::from(src[(sy * w + sx) * CHANNELS + c]);
                        }
                        dst_row[x * CHANNELS + c] = (acc / 16) as u8;
                    }
                }
            });
    }

    FrameBuffer::from_rgba(w, h, out).expect("smoothed buffer keeps source dimensions")
}

/// Stretch the frame's contrast by clipping the luminance histogram at the
/// 2nd and 98th percentiles and rescaling linearly.
///
/// Returns a new grayscale-equivalent RGBA buffer (R = G = B = stretched
/// luminance, alpha preserved). A flat histogram maps through unchanged.
#[must_use]
pub fn contrast_stretch(frame: &FrameBuffer) -> FrameBuffer {
    let w = frame.width();
    let h = frame.height();
    let src = frame.data();

    let mut histogram = [0u32; 256];
    for px in src.chunks_exact(CHANNELS) {
        let bin = (luma(px[0], px[1], px[2]).round() as usize).min(255);
        histogram[bin] += 1;
    }

    let total = (w * h) as f64;
    let lo = percentile(&histogram, total * 0.02);
    let hi = percentile(&histogram, total * 0.98);

    let mut out = Vec::with_capacity(src.len());
    if hi > lo {
        let scale = 255.0 / f32::from(hi - lo);
        for px in src.chunks_exact(CHANNELS) {
            let l = luma(px[0], px[1], px[2]);
            let v = ((l - f32::from(lo)) * scale).round().clamp(0.0, 255.0) as u8;
            out.extend_from_slice(&[v, v, v, px[3]]);
        }
    } else {
        for px in src.chunks_exact(CHANNELS) {
            let v = (luma(px[0], px[1], px[2]).round() as usize).min(255) as u8;
            out.extend_from_slice(&[v, v, v, px[3]]);
        }
    }

    FrameBuffer::from_rgba(w, h, out).expect("stretched buffer keeps source dimensions")
}

/// Smallest luminance bin whose cumulative count reaches `target`.
fn percentile(histogram: &[u32; 256], target: f64) -> u8 {
    let mut cum = 0.0;
    for (bin, &count) in histogram.iter().enumerate() {
        cum += f64::from(count);
        if cum >= target {
            return bin as u8;
        }
    }
    255
}
