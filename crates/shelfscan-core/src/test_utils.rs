//! Synthetic scenes for tests and benches.
//!
//! [`render_bar_pattern`] paints a clean, guard-delimited bar pattern the
//! basic pattern decoder can recover exactly, one pixel column per bit, with
//! optional Gaussian pixel noise on top.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use crate::frame::{FrameBuffer, CHANNELS};

/// Dark-bit fraction a segment is rendered with for each digit of the
/// heuristic's alphabet.
fn digit_fill(digit: char) -> f32 {
    match digit {
        '0' => 0.10,
        '1' => 0.80,
        '2' => 0.35,
        '3' => 0.40,
        '4' => 0.50,
        '7' => 0.60,
        other => panic!("digit {other:?} is outside the decoder's alphabet (0,1,2,3,4,7)"),
    }
}

/// Render a 12-digit guard-delimited bar pattern into an RGBA frame.
///
/// Layout: a `101` guard, twelve payload segments of `segment_width` bits,
/// and a closing `101` guard, edge to edge (no margins). Dark bits render as
/// black columns, light bits as white. Every row is identical, so any
/// scanline in the sampled band sees the same signature.
///
/// For the pattern to survive the decoder's smoothing pass, dark bits are
/// laid out in runs of at least two: each segment's dark run sits at the
/// segment start, except the final segment, whose run abuts the closing
/// guard. Digit mixes whose overall dark fraction stays between roughly one
/// half and three quarters decode reliably; `"174174174174"` is the
/// canonical pattern.
///
/// # Panics
/// Panics on digits outside `{0,1,2,3,4,7}`, fewer/more than 12 digits, or
/// `segment_width < 20`.
#[must_use]
pub fn render_bar_pattern(
    digits: &str,
    segment_width: usize,
    height: usize,
    noise_sigma: f32,
) -> FrameBuffer {
    assert_eq!(digits.chars().count(), 12, "exactly 12 digits required");
    assert!(segment_width >= 20, "segment_width must be at least 20");

    let mut bits: Vec<bool> = vec![true, false, true];
    let last = digits.chars().count() - 1;
    for (i, digit) in digits.chars().enumerate() {
        let dark = (digit_fill(digit) * segment_width as f32).round() as usize;
        for pos in 0..segment_width {
            let is_dark = if i == last {
                pos >= segment_width - dark
            } else {
                pos < dark
            };
            bits.push(is_dark);
        }
    }
    bits.extend_from_slice(&[true, false, true]);

    let width = bits.len();
    let mut data = Vec::with_capacity(width * height * CHANNELS);
    for _ in 0..height {
        for &dark in &bits {
            let v = if dark { 0 } else { 255 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }

    if noise_sigma > 0.0 {
        let mut rng = thread_rng();
        let normal = Normal::new(0.0, f64::from(noise_sigma)).expect("valid noise sigma");
        for px in data.chunks_exact_mut(CHANNELS) {
            let delta = normal.sample(&mut rng) as i32;
            for channel in px.iter_mut().take(3) {
                *channel = (i32::from(*channel) + delta).clamp(0, 255) as u8;
            }
        }
    }

    FrameBuffer::from_rgba(width, height, data).expect("rendered pattern is a valid frame")
}

/// A frame of one uniform gray value.
#[must_use]
pub fn uniform_frame(width: usize, height: usize, value: u8) -> FrameBuffer {
    let data = [value, value, value, 255].repeat(width * height);
    FrameBuffer::from_rgba(width, height, data).expect("uniform frame is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_dimensions() {
        let frame = render_bar_pattern("174174174174", 20, 40, 0.0);
        assert_eq!(frame.width(), 12 * 20 + 6);
        assert_eq!(frame.height(), 40);
    }

    #[test]
    fn guards_sit_at_the_edges() {
        let frame = render_bar_pattern("174174174174", 20, 10, 0.0);
        let w = frame.width();
        for (x, expect_dark) in [(0, true), (1, false), (2, true)] {
            assert_eq!(frame.pixel(x, 0)[0] == 0, expect_dark);
            assert_eq!(frame.pixel(w - 1 - x, 0)[0] == 0, expect_dark);
        }
    }

    #[test]
    #[should_panic(expected = "alphabet")]
    fn rejects_unreachable_digits() {
        let _ = render_bar_pattern("999999999999", 20, 10, 0.0);
    }
}
