//! Configuration types for the detection pipeline.
//!
//! Two levels of configuration exist:
//! - [`PipelineConfig`]: process-wide settings, read at startup and immutable
//!   after the orchestrator is constructed.
//! - [`HeuristicConfig`]: the tunables of the basic pattern decoder. The
//!   digit cutoffs are empirically chosen values; the heuristic's behavior is
//!   defined by them, so they live here as plain constants rather than being
//!   derived.

use std::time::Duration;

use crate::validate::ValidationPolicy;

/// Tunables of the basic pattern decoder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeuristicConfig {
    /// Number of horizontal scanlines sampled per pass (default: 15).
    pub scanline_count: usize,
    /// Top of the sampling band as a fraction of image height (default: 0.30).
    pub band_start: f32,
    /// Bottom of the sampling band as a fraction of image height (default: 0.70).
    pub band_end: f32,
    /// Minimum distance in bits between the opening and closing guard
    /// patterns for a payload to be sliced (default: 30).
    pub guard_min_span: usize,
    /// Maximum length of the raw-bits diagnostic string (default: 64).
    pub raw_diagnostic_limit: usize,
    /// Segment dark-bit fraction above which the digit is `1` (default: 0.70).
    pub digit_one_min: f32,
    /// Segment dark-bit fraction below which the digit is `0` (default: 0.30).
    pub digit_zero_max: f32,
    /// Fraction above which the digit is `7` (default: 0.55).
    pub digit_seven_min: f32,
    /// Fraction above which the digit is `4` (default: 0.45).
    pub digit_four_min: f32,
    /// Fraction above which the digit is `3`; anything left is `2`
    /// (default: 0.35).
    pub digit_three_min: f32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            scanline_count: 15,
            band_start: 0.30,
            band_end: 0.70,
            guard_min_span: 30,
            raw_diagnostic_limit: 64,
            digit_one_min: 0.70,
            digit_zero_max: 0.30,
            digit_seven_min: 0.55,
            digit_four_min: 0.45,
            digit_three_min: 0.35,
        }
    }
}

/// Process-wide pipeline configuration.
///
/// Immutable after the orchestrator is constructed. Use the builder for
/// ergonomic construction.
///
/// # Example
/// ```
/// use shelfscan_core::config::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::builder()
///     .scan_interval(Duration::from_millis(100))
///     .min_code_length(8)
///     .build();
/// assert_eq!(config.validation.min_length, 8);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Candidate acceptance policy.
    pub validation: ValidationPolicy,
    /// Interval between live-scan frame samples (default: 200ms).
    pub scan_interval: Duration,
    /// Artificial delay before the fallback engine stage is permitted
    /// (default: zero; stage priority is an ordering guarantee, not a
    /// timing one).
    pub fallback_delay: Duration,
    /// Basic pattern decoder tunables.
    pub heuristic: HeuristicConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::default(),
            scan_interval: Duration::from_millis(200),
            fallback_delay: Duration::ZERO,
            heuristic: HeuristicConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Default)]
pub struct PipelineConfigBuilder {
    validation: Option<ValidationPolicy>,
    scan_interval: Option<Duration>,
    fallback_delay: Option<Duration>,
    heuristic: Option<HeuristicConfig>,
    min_code_length: Option<usize>,
    max_code_length: Option<usize>,
    allowed_symbols: Option<String>,
}

impl PipelineConfigBuilder {
    /// Replace the whole validation policy.
    #[must_use]
    pub fn validation(mut self, policy: ValidationPolicy) -> Self {
        self.validation = Some(policy);
        self
    }

    /// Set the minimum accepted code length.
    #[must_use]
    pub fn min_code_length(mut self, len: usize) -> Self {
        self.min_code_length = Some(len);
        self
    }

    /// Set the maximum accepted code length.
    #[must_use]
    pub fn max_code_length(mut self, len: usize) -> Self {
        self.max_code_length = Some(len);
        self
    }

    /// Set the non-alphanumeric characters the policy accepts.
    #[must_use]
    pub fn allowed_symbols(mut self, symbols: impl Into<String>) -> Self {
        self.allowed_symbols = Some(symbols.into());
        self
    }

    /// Set the live-scan sampling interval.
    #[must_use]
    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = Some(interval);
        self
    }

    /// Set the artificial delay before the fallback engine stage.
    #[must_use]
    pub fn fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = Some(delay);
        self
    }

    /// Replace the heuristic tunables.
    #[must_use]
    pub fn heuristic(mut self, heuristic: HeuristicConfig) -> Self {
        self.heuristic = Some(heuristic);
        self
    }

    /// Build the configuration, using defaults for unset fields.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        let d = PipelineConfig::default();
        let mut validation = self.validation.unwrap_or(d.validation);
        if let Some(len) = self.min_code_length {
            validation.min_length = len;
        }
        if let Some(len) = self.max_code_length {
            validation.max_length = len;
        }
        if let Some(symbols) = self.allowed_symbols {
            validation.allowed_symbols = symbols;
        }
        PipelineConfig {
            validation,
            scan_interval: self.scan_interval.unwrap_or(d.scan_interval),
            fallback_delay: self.fallback_delay.unwrap_or(d.fallback_delay),
            heuristic: self.heuristic.unwrap_or(d.heuristic),
        }
    }
}
