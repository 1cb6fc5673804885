#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use std::io::Cursor;
use std::sync::atomic::Ordering;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use common::{EngineBehavior, FakeEngine, RecordingClipboard};
use shelfscan_core::pattern::HEURISTIC_DIGITS_PREFIX;
use shelfscan_core::{acquire, test_utils, DetectMethod, Orchestrator};

const EAN13: &str = "4006381333931";

fn data_url_of(frame: &shelfscan_core::FrameBuffer) -> String {
    let img = image::RgbaImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.data().to_vec(),
    )
    .unwrap();
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(out.into_inner()))
}

#[test]
fn primary_hit_short_circuits_fallback() {
    let mut orchestrator = Orchestrator::new();
    let (primary, primary_calls) = FakeEngine::boxed("wasm", EngineBehavior::Code(EAN13.into()));
    let (fallback, fallback_calls) = FakeEngine::boxed("classic", EngineBehavior::Code("999999".into()));
    orchestrator.set_primary_engine(primary);
    orchestrator.set_fallback_engine(fallback);

    // A clean EAN-13 arriving as an image data URL.
    let url = data_url_of(&test_utils::render_bar_pattern("174174174174", 20, 60, 0.0));
    let frame = acquire::from_data_url(&url).unwrap();

    let candidate = orchestrator.detect(&frame).unwrap();
    assert_eq!(candidate.code, EAN13);
    assert_eq!(candidate.method, DetectMethod::PrimaryEngine);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn engine_failure_falls_through_to_fallback() {
    let mut orchestrator = Orchestrator::new();
    let (primary, primary_calls) = FakeEngine::boxed("wasm", EngineBehavior::Fail);
    let (fallback, _) = FakeEngine::boxed("classic", EngineBehavior::Code(EAN13.into()));
    orchestrator.set_primary_engine(primary);
    orchestrator.set_fallback_engine(fallback);

    let frame = test_utils::uniform_frame(32, 32, 128);
    let candidate = orchestrator.detect(&frame).unwrap();
    assert_eq!(candidate.method, DetectMethod::FallbackEngine);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn nonconformant_primary_output_is_not_a_short_circuit() {
    let mut orchestrator = Orchestrator::new();
    // Two characters: below the default minimum length.
    let (primary, _) = FakeEngine::boxed("wasm", EngineBehavior::Code("ab".into()));
    let (fallback, fallback_calls) = FakeEngine::boxed("classic", EngineBehavior::Code(EAN13.into()));
    orchestrator.set_primary_engine(primary);
    orchestrator.set_fallback_engine(fallback);

    let frame = test_utils::uniform_frame(32, 32, 128);
    let (candidate, stats) = orchestrator.detect_with_stats(&frame);
    let candidate = candidate.unwrap();
    assert_eq!(candidate.method, DetectMethod::FallbackEngine);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.rejected_by_validation, 1);
}

#[test]
fn heuristic_recovers_clean_pattern_horizontally() {
    let mut orchestrator = Orchestrator::new();
    let (primary, _) = FakeEngine::boxed("wasm", EngineBehavior::Nothing);
    let (fallback, _) = FakeEngine::boxed("classic", EngineBehavior::Fail);
    orchestrator.set_primary_engine(primary);
    orchestrator.set_fallback_engine(fallback);

    let frame = test_utils::render_bar_pattern("174174174174", 20, 60, 0.0);
    let candidate = orchestrator.detect(&frame).unwrap();
    assert_eq!(candidate.code, format!("{HEURISTIC_DIGITS_PREFIX}174174174174"));
    assert_eq!(candidate.method, DetectMethod::HeuristicHorizontal);
}

#[test]
fn heuristic_finds_rotated_pattern_vertically() {
    let orchestrator = Orchestrator::new();
    let frame = test_utils::render_bar_pattern("174174174174", 20, 60, 0.0).rotate90();
    let candidate = orchestrator.detect(&frame).unwrap();
    assert_eq!(candidate.method, DetectMethod::HeuristicVertical);
    // Bars read back in reversed segment order on the rotated buffer.
    assert_eq!(candidate.code, format!("{HEURISTIC_DIGITS_PREFIX}471471471471"));
}

#[test]
fn exhausted_stages_yield_empty_result_with_diagnostic() {
    let mut orchestrator = Orchestrator::new();
    let (primary, _) = FakeEngine::boxed("wasm", EngineBehavior::Nothing);
    orchestrator.set_primary_engine(primary);

    let frame = test_utils::uniform_frame(48, 48, 90);
    let result = orchestrator.detect_full(&frame);
    assert!(result.candidate.is_none());
    let diag = result.raw_diagnostic.unwrap();
    assert!(diag.starts_with(shelfscan_core::pattern::RAW_BITS_PREFIX));
}

#[test]
fn blurred_pattern_never_panics() {
    // Heavy noise: a best-guess, a rejection, or nothing are all acceptable;
    // a panic is not.
    let orchestrator = Orchestrator::new();
    for sigma in [30.0, 80.0, 140.0] {
        let frame = test_utils::render_bar_pattern("174174174174", 20, 60, sigma);
        let _ = orchestrator.detect_full(&frame);
    }
}

#[test]
fn accepted_code_is_copied_to_clipboard() {
    let mut orchestrator = Orchestrator::new();
    let (primary, _) = FakeEngine::boxed("wasm", EngineBehavior::Code(EAN13.into()));
    let (clipboard, writes) = RecordingClipboard::boxed(false);
    orchestrator.set_primary_engine(primary);
    orchestrator.set_clipboard(clipboard);

    let frame = test_utils::uniform_frame(16, 16, 128);
    assert!(orchestrator.detect(&frame).is_some());
    assert_eq!(writes.lock().unwrap().as_slice(), [EAN13.to_string()]);
}

#[test]
fn denied_clipboard_does_not_fail_detection() {
    let mut orchestrator = Orchestrator::new();
    let (primary, _) = FakeEngine::boxed("wasm", EngineBehavior::Code(EAN13.into()));
    let (clipboard, writes) = RecordingClipboard::boxed(true);
    orchestrator.set_primary_engine(primary);
    orchestrator.set_clipboard(clipboard);

    let frame = test_utils::uniform_frame(16, 16, 128);
    let candidate = orchestrator.detect(&frame).unwrap();
    assert_eq!(candidate.code, EAN13);
    assert!(writes.lock().unwrap().is_empty());
}

#[test]
fn rejected_code_is_never_copied() {
    let mut orchestrator = Orchestrator::new();
    let (primary, _) = FakeEngine::boxed("wasm", EngineBehavior::Code("!!".into()));
    let (clipboard, writes) = RecordingClipboard::boxed(false);
    orchestrator.set_primary_engine(primary);
    orchestrator.set_clipboard(clipboard);

    let frame = test_utils::uniform_frame(16, 16, 128);
    assert!(orchestrator.detect(&frame).is_none());
    assert!(writes.lock().unwrap().is_empty());
}
