//! Oscillator bank: main oscillator, sub-oscillator and noise source
//!
//! Waveforms are naive (not band-limited). The aliasing is part of the sound.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Highest oscillator frequency accepted, in Hz
pub const MAX_FREQUENCY: f64 = 20_000.0;

/// Detune range in cents (either direction)
pub const MAX_DETUNE_CENTS: f64 = 100.0;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Triangle,
    #[default]
    Sawtooth,
    /// Square/pulse, duty cycle set by the pulse width
    Square,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Sawtooth,
        Waveform::Square,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Square => "square",
        }
    }

    /// Lenient lookup for live control paths. An unknown name is a caller
    /// bug: debug builds panic, release builds fall back to sine.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: SynthError| {
            if cfg!(debug_assertions) {
                panic!("{}", err);
            }
            tracing::warn!("{}, falling back to sine", err);
            Waveform::Sine
        })
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "square" | "pulse" => Ok(Waveform::Square),
            _ => Err(SynthError::UnknownWaveform(s.to_string())),
        }
    }
}

/// Value of `waveform` at `phase` (0..1). Always in [-1, 1].
pub fn waveform_value(waveform: Waveform, phase: f64, pulse_width: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * 2.0 * PI).sin(),
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Square => {
            if phase < pulse_width {
                1.0
            } else {
                -1.0
            }
        }
    }
}

/// A phase-accumulating oscillator
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    frequency: f64,
    pulse_width: f64,
    detune_cents: f64,
}

impl Oscillator {
    /// Create a new oscillator at phase 0
    pub fn new(waveform: Waveform, frequency: f64) -> Self {
        let mut osc = Self {
            waveform,
            phase: 0.0,
            frequency: 0.0,
            pulse_width: 0.5,
            detune_cents: 0.0,
        };
        osc.set_frequency(frequency);
        osc
    }

    /// Sub-oscillator: square wave one octave below `frequency`
    pub fn sub(frequency: f64) -> Self {
        Self::new(Waveform::Square, frequency * 0.5)
    }

    /// Set the frequency. Negative or non-finite values clamp to 0.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = if frequency.is_finite() {
            frequency.clamp(0.0, MAX_FREQUENCY)
        } else {
            0.0
        };
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Pulse width (duty cycle) for the square waveform, 0.0-1.0
    pub fn set_pulse_width(&mut self, width: f64) {
        self.pulse_width = width.clamp(0.0, 1.0);
    }

    pub fn pulse_width(&self) -> f64 {
        self.pulse_width
    }

    pub fn set_detune(&mut self, cents: f64) {
        self.detune_cents = cents.clamp(-MAX_DETUNE_CENTS, MAX_DETUNE_CENTS);
    }

    pub fn detune(&self) -> f64 {
        self.detune_cents
    }

    /// Frequency after detune is applied
    pub fn effective_frequency(&self) -> f64 {
        if self.detune_cents == 0.0 {
            self.frequency
        } else {
            self.frequency * (self.detune_cents / 1200.0).exp2()
        }
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Reset the phase
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Generate the next sample and advance the phase
    pub fn next_sample(&mut self, sample_rate: f64) -> f64 {
        let sample = waveform_value(self.waveform, self.phase, self.pulse_width);

        if sample_rate > 0.0 {
            self.phase += self.effective_frequency() / sample_rate;
            if self.phase >= 1.0 {
                self.phase = self.phase.fract();
            }
        }

        sample
    }
}

/// White noise source (uniform, xorshift)
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng_state: u64,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng_state: seed.max(1),
        }
    }

    /// Uniform random value in -1.0..=1.0
    pub fn next_sample(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x as f64 / u64::MAX as f64) * 2.0 - 1.0
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(0x2545_F491_4F6C_DD1D)
    }
}
