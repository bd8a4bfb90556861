//! State-variable filter
//!
//! Two-integrator (Chamberlin) topology with simultaneous lowpass, bandpass
//! and highpass outputs. Cutoff and resonance are passed in on every sample
//! so modulation never touches the stored settings.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Lowest cutoff frequency in Hz
pub const MIN_CUTOFF: f64 = 20.0;

/// Highest cutoff frequency accepted from the control surface, in Hz.
/// The render path further limits the cutoff to `max_cutoff(sample_rate)`.
pub const MAX_CUTOFF: f64 = 20_000.0;

/// Resonance (Q) range
pub const MIN_RESONANCE: f64 = 0.0;
pub const MAX_RESONANCE: f64 = 30.0;

/// Q values below this are treated as this, keeping the damping finite
const MIN_Q: f64 = 0.5;

/// Filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    #[serde(alias = "lowpass")]
    LowPass,
    #[serde(alias = "bandpass")]
    BandPass,
    #[serde(alias = "highpass")]
    HighPass,
}

impl FilterType {
    pub fn name(&self) -> &'static str {
        match self {
            FilterType::LowPass => "lowpass",
            FilterType::BandPass => "bandpass",
            FilterType::HighPass => "highpass",
        }
    }

    /// Lenient lookup for live control paths. An unknown name is a caller
    /// bug: debug builds panic, release builds fall back to lowpass.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: SynthError| {
            if cfg!(debug_assertions) {
                panic!("{}", err);
            }
            tracing::warn!("{}, falling back to lowpass", err);
            FilterType::LowPass
        })
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for FilterType {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowpass" | "low_pass" | "lp" => Ok(FilterType::LowPass),
            "bandpass" | "band_pass" | "bp" => Ok(FilterType::BandPass),
            "highpass" | "high_pass" | "hp" => Ok(FilterType::HighPass),
            _ => Err(SynthError::UnknownFilterType(s.to_string())),
        }
    }
}

/// Highest cutoff used at `sample_rate` (half of Nyquist)
pub fn max_cutoff(sample_rate: f64) -> f64 {
    (sample_rate * 0.25).max(MIN_CUTOFF)
}

/// Clamp a cutoff into the renderable range for `sample_rate`
pub fn clamp_cutoff(cutoff: f64, sample_rate: f64) -> f64 {
    if cutoff.is_finite() {
        cutoff.clamp(MIN_CUTOFF, max_cutoff(sample_rate))
    } else {
        MIN_CUTOFF
    }
}

/// Clamp a resonance into `MIN_RESONANCE..=MAX_RESONANCE`
pub fn clamp_resonance(resonance: f64) -> f64 {
    if resonance.is_finite() {
        resonance.clamp(MIN_RESONANCE, MAX_RESONANCE)
    } else {
        MIN_RESONANCE
    }
}

/// Damping factor for a resonance (Q) value
pub fn damping(resonance: f64) -> f64 {
    1.0 / clamp_resonance(resonance).max(MIN_Q)
}

/// Frequency coefficient, limited so the filter stays stable for damping `q`.
///
/// The recursion is stable while `f^2 + 2fq < 4`.
pub fn frequency_coefficient(cutoff: f64, sample_rate: f64, q: f64) -> f64 {
    let f = 2.0 * (PI * cutoff / sample_rate).sin();
    let limit = 0.98 * ((q * q + 4.0).sqrt() - q);
    f.min(limit)
}

/// All three responses for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOutputs {
    pub lowpass: f64,
    pub bandpass: f64,
    pub highpass: f64,
}

impl FilterOutputs {
    pub fn select(&self, filter_type: FilterType) -> f64 {
        match filter_type {
            FilterType::LowPass => self.lowpass,
            FilterType::BandPass => self.bandpass,
            FilterType::HighPass => self.highpass,
        }
    }
}

/// State-variable filter. Only the two integrators persist between samples.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    filter_type: FilterType,
    low: f64,
    band: f64,
}

impl Filter {
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            low: 0.0,
            band: 0.0,
        }
    }

    pub fn set_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Reset filter state (clear history)
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    /// Integrator states (lowpass, bandpass)
    pub fn state(&self) -> (f64, f64) {
        (self.low, self.band)
    }

    /// Run one sample and return every response
    pub fn process_all(
        &mut self,
        input: f64,
        cutoff: f64,
        resonance: f64,
        sample_rate: f64,
    ) -> FilterOutputs {
        let cutoff = clamp_cutoff(cutoff, sample_rate);
        let q = damping(resonance);
        let f = frequency_coefficient(cutoff, sample_rate, q);

        let band = self.band + f * (input - self.low - q * self.band);
        let low = self.low + f * band;
        let high = input - low - q * band;

        if !(low.is_finite() && band.is_finite() && high.is_finite()) {
            self.reset();
            return FilterOutputs {
                lowpass: 0.0,
                bandpass: 0.0,
                highpass: 0.0,
            };
        }
        self.low = low;
        self.band = band;

        FilterOutputs {
            lowpass: low,
            bandpass: band,
            highpass: high,
        }
    }

    /// Run one sample and return the response selected by the filter type
    pub fn process(&mut self, input: f64, cutoff: f64, resonance: f64, sample_rate: f64) -> f64 {
        let filter_type = self.filter_type;
        self.process_all(input, cutoff, resonance, sample_rate)
            .select(filter_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn sine(freq: f64, i: usize) -> f64 {
        (2.0 * PI * freq * i as f64 / SR).sin()
    }

    #[test]
    fn test_cutoff_clamping() {
        assert_eq!(clamp_cutoff(5.0, SR), MIN_CUTOFF);
        assert_eq!(clamp_cutoff(25_000.0, SR), SR / 4.0);
        assert_eq!(clamp_cutoff(f64::INFINITY, SR), MIN_CUTOFF);
    }

    #[test]
    fn test_resonance_clamping() {
        assert_eq!(clamp_resonance(-1.0), 0.0);
        assert_eq!(clamp_resonance(100.0), MAX_RESONANCE);
        assert_eq!(damping(0.0), 2.0);
        assert_eq!(damping(10.0), 0.1);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut filter = Filter::new(FilterType::LowPass);

        let mut max_output = 0.0f64;
        for i in 0..2000 {
            let output = filter.process(sine(5000.0, i), 100.0, 0.7, SR);
            if i > 500 {
                max_output = max_output.max(output.abs());
            }
        }

        assert!(max_output < 0.05, "Expected attenuation, got {}", max_output);
    }

    #[test]
    fn test_lowpass_passes_low_frequencies() {
        let mut filter = Filter::new(FilterType::LowPass);

        let mut sum_input_sq = 0.0;
        let mut sum_output_sq = 0.0;
        for i in 0..4410 {
            let input = sine(100.0, i);
            let output = filter.process(input, 5000.0, 0.707, SR);
            if i > 100 {
                sum_input_sq += input * input;
                sum_output_sq += output * output;
            }
        }

        let ratio = (sum_output_sq / sum_input_sq).sqrt();
        assert!(ratio > 0.9, "Expected passthrough, got ratio={}", ratio);
    }

    #[test]
    fn test_highpass_filter() {
        let mut filter = Filter::new(FilterType::HighPass);

        let mut max_output = 0.0f64;
        for i in 0..4000 {
            let output = filter.process(sine(100.0, i), 2000.0, 0.707, SR);
            if i > 1000 {
                max_output = max_output.max(output.abs());
            }
        }

        assert!(max_output < 0.1, "Expected attenuation, got {}", max_output);
    }

    #[test]
    fn test_bandpass_peaks_at_cutoff() {
        let measure = |freq: f64| {
            let mut filter = Filter::new(FilterType::BandPass);
            let mut peak = 0.0f64;
            for i in 0..8000 {
                let output = filter.process(sine(freq, i), 1000.0, 2.0, SR);
                if i > 4000 {
                    peak = peak.max(output.abs());
                }
            }
            peak
        };

        let at_cutoff = measure(1000.0);
        assert!(at_cutoff > measure(100.0) * 2.0);
        assert!(at_cutoff > measure(8000.0) * 2.0);
    }

    #[test]
    fn test_outputs_sum_to_input() {
        let mut filter = Filter::new(FilterType::LowPass);
        for i in 0..100 {
            let input = sine(440.0, i);
            let out = filter.process_all(input, 1200.0, 3.0, SR);
            let q = damping(3.0);
            let sum = out.lowpass + q * out.bandpass + out.highpass;
            assert!((sum - input).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stable_at_max_resonance_and_cutoff() {
        let mut filter = Filter::new(FilterType::LowPass);
        let mut peak = 0.0f64;

        for i in 0..10_000 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let out = filter.process_all(input, max_cutoff(SR), MAX_RESONANCE, SR);
            for v in [out.lowpass, out.bandpass, out.highpass] {
                assert!(v.is_finite());
                peak = peak.max(v.abs());
            }
        }

        assert!(peak < 10.0, "peak = {}", peak);
        let (low, band) = filter.state();
        assert!(low.abs() < 1e-6 && band.abs() < 1e-6, "impulse response did not decay");
    }

    #[test]
    fn test_stable_at_zero_resonance_and_max_cutoff() {
        let mut filter = Filter::new(FilterType::HighPass);
        for i in 0..10_000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            let out = filter.process(input, max_cutoff(SR), 0.0, SR);
            assert!(out.is_finite() && out.abs() < 100.0);
        }
    }

    #[test]
    fn test_high_resonance_rings() {
        let mut filter = Filter::new(FilterType::LowPass);
        filter.process(1.0, 1000.0, MAX_RESONANCE, SR);

        // Still ringing well after the impulse
        let mut late_peak = 0.0f64;
        for i in 0..2000 {
            let out = filter.process(0.0, 1000.0, MAX_RESONANCE, SR);
            if i > 1000 {
                late_peak = late_peak.max(out.abs());
            }
        }
        assert!(late_peak > 1e-3);
    }

    #[test]
    fn test_non_finite_input_resets_state() {
        let mut filter = Filter::new(FilterType::LowPass);
        filter.process(1.0, 1000.0, 1.0, SR);
        filter.process(f64::NAN, 1000.0, 1.0, SR);
        assert_eq!(filter.state(), (0.0, 0.0));
    }

    #[test]
    fn test_filter_reset() {
        let mut filter = Filter::new(FilterType::LowPass);
        for _ in 0..100 {
            filter.process(1.0, 1000.0, 0.7, SR);
        }

        filter.reset();

        let output = filter.process(0.0, 1000.0, 0.7, SR);
        assert!(output.abs() < 0.001, "Expected near-zero after reset, got {}", output);
    }

    #[test]
    fn test_filter_type_parsing() {
        assert_eq!("bandpass".parse::<FilterType>().unwrap(), FilterType::BandPass);
        assert!("notch".parse::<FilterType>().is_err());
    }

    #[test]
    fn test_filter_type_lenient_lookup_known_name() {
        assert_eq!(FilterType::from_name_or_default("hp"), FilterType::HighPass);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "unknown filter type"))]
    fn test_filter_type_lenient_lookup_unknown_name() {
        assert_eq!(FilterType::from_name_or_default("notch"), FilterType::LowPass);
    }
}
