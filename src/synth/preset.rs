//! Parameter bundles and the factory preset bank

use serde::{Deserialize, Serialize};

use super::envelope::EnvelopeParams;
use super::filter::{FilterType, MAX_CUTOFF, MAX_RESONANCE, MIN_CUTOFF};
use super::lfo::{LfoWaveform, MAX_LFO_RATE};
use super::oscillator::{Waveform, MAX_DETUNE_CENTS};
use crate::error::{Result, SynthError};

/// Every tunable of the synth.
///
/// Values outside their documented range are accepted and clamped by
/// [`PresetParameters::clamped`] when applied; nothing here is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetParameters {
    pub waveform: Waveform,
    /// Duty cycle of the square waveform, 0.0-1.0
    pub pulse_width: f64,
    pub detune_cents: f64,
    /// Sub-oscillator crossfade, 0.0-1.0
    pub sub_osc_level: f64,
    /// Noise crossfade, 0.0-1.0
    pub noise_level: f64,

    pub filter_type: FilterType,
    /// Base cutoff in Hz
    pub cutoff: f64,
    /// Resonance (Q), 0-30
    pub resonance: f64,
    /// Cutoff offset in Hz at full filter-envelope level
    pub filter_env_amount: f64,

    pub amp_envelope: EnvelopeParams,
    pub filter_envelope: EnvelopeParams,

    pub lfo_waveform: LfoWaveform,
    /// LFO rate in Hz
    pub lfo_rate: f64,
    /// LFO depth as a fraction of the base cutoff, 0.0-1.0
    pub lfo_depth: f64,
}

impl Default for PresetParameters {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            pulse_width: 0.5,
            detune_cents: 0.0,
            sub_osc_level: 0.3,
            noise_level: 0.0,
            filter_type: FilterType::LowPass,
            cutoff: 2000.0,
            resonance: 0.7,
            filter_env_amount: 1000.0,
            amp_envelope: EnvelopeParams::default(),
            filter_envelope: EnvelopeParams::default(),
            lfo_waveform: LfoWaveform::Sine,
            lfo_rate: 5.0,
            lfo_depth: 0.3,
        }
    }
}

impl PresetParameters {
    /// Copy with every field moved into its valid range
    pub fn clamped(self) -> Self {
        Self {
            pulse_width: unit(self.pulse_width, 0.5),
            detune_cents: bounded(self.detune_cents, -MAX_DETUNE_CENTS, MAX_DETUNE_CENTS, 0.0),
            sub_osc_level: unit(self.sub_osc_level, 0.0),
            noise_level: unit(self.noise_level, 0.0),
            cutoff: bounded(self.cutoff, MIN_CUTOFF, MAX_CUTOFF, MAX_CUTOFF),
            resonance: bounded(self.resonance, 0.0, MAX_RESONANCE, 0.0),
            filter_env_amount: bounded(self.filter_env_amount, -MAX_CUTOFF, MAX_CUTOFF, 0.0),
            amp_envelope: self.amp_envelope.clamped(),
            filter_envelope: self.filter_envelope.clamped(),
            lfo_rate: bounded(self.lfo_rate, 0.0, MAX_LFO_RATE, 0.0),
            lfo_depth: unit(self.lfo_depth, 0.0),
            ..self
        }
    }

    /// Same envelope shape for amplitude and filter
    fn with_envelope(mut self, envelope: EnvelopeParams) -> Self {
        self.amp_envelope = envelope;
        self.filter_envelope = envelope;
        self
    }
}

fn bounded(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

fn unit(value: f64, fallback: f64) -> f64 {
    bounded(value, 0.0, 1.0, fallback)
}

/// A named parameter bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(flatten)]
    pub parameters: PresetParameters,
}

impl Preset {
    pub fn new(name: impl Into<String>, parameters: PresetParameters) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Names of the built-in presets, in bank order
pub const FACTORY_PRESET_NAMES: [&str; 5] = ["bass", "lead", "acid", "pad", "brass"];

/// Build a factory preset. The filter-envelope amount is given as a
/// multiple of the cutoff.
fn factory(
    waveform: Waveform,
    cutoff: f64,
    resonance: f64,
    envelope: EnvelopeParams,
    env_multiple: f64,
    sub_osc_level: f64,
) -> PresetParameters {
    PresetParameters {
        waveform,
        cutoff,
        resonance,
        filter_env_amount: env_multiple * cutoff,
        sub_osc_level,
        ..PresetParameters::default()
    }
    .with_envelope(envelope)
}

/// Parameters of a factory preset, if `name` is one
pub fn factory_parameters(name: &str) -> Option<PresetParameters> {
    let params = match name.trim().to_ascii_lowercase().as_str() {
        "bass" => factory(
            Waveform::Sawtooth,
            800.0,
            1.2,
            EnvelopeParams::new(0.01, 0.4, 0.3, 0.2),
            1.5,
            0.5,
        ),
        "lead" => factory(
            Waveform::Square,
            3000.0,
            0.5,
            EnvelopeParams::new(0.05, 0.3, 0.7, 0.3),
            0.8,
            0.0,
        ),
        "acid" => factory(
            Waveform::Square,
            500.0,
            2.0,
            EnvelopeParams::new(0.01, 0.2, 0.0, 0.1),
            2.0,
            0.0,
        ),
        "pad" => factory(
            Waveform::Sawtooth,
            1500.0,
            0.3,
            EnvelopeParams::new(0.8, 0.5, 0.8, 1.5),
            0.3,
            0.3,
        ),
        "brass" => factory(
            Waveform::Sawtooth,
            2500.0,
            0.8,
            EnvelopeParams::new(0.1, 0.4, 0.6, 0.3),
            1.0,
            0.2,
        ),
        _ => return None,
    };
    Some(params)
}

/// The built-in preset bank
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESET_NAMES
        .iter()
        .filter_map(|name| factory_parameters(name).map(|p| Preset::new(*name, p)))
        .collect()
}

/// Look up a factory preset by name
pub fn find_preset(name: &str) -> Result<Preset> {
    factory_parameters(name)
        .map(|p| Preset::new(name.trim().to_ascii_lowercase(), p))
        .ok_or_else(|| SynthError::UnknownPreset(name.to_string()))
}
