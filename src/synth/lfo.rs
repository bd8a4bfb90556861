//! Low Frequency Oscillator for filter modulation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::oscillator::{waveform_value, Waveform};
use crate::error::SynthError;

/// Highest LFO rate accepted, in Hz
pub const MAX_LFO_RATE: f64 = 50.0;

/// LFO waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LfoWaveform {
    #[default]
    Sine,
    Triangle,
    Square,
    /// Random value held for one cycle
    #[serde(alias = "random")]
    SampleAndHold,
}

impl LfoWaveform {
    pub fn name(&self) -> &'static str {
        match self {
            LfoWaveform::Sine => "sine",
            LfoWaveform::Triangle => "triangle",
            LfoWaveform::Square => "square",
            LfoWaveform::SampleAndHold => "sample_and_hold",
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
            LfoWaveform::Sine
        })
    }
}

impl fmt::Display for LfoWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for LfoWaveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(LfoWaveform::Sine),
            "triangle" | "tri" => Ok(LfoWaveform::Triangle),
            "square" => Ok(LfoWaveform::Square),
            "sample_and_hold" | "s&h" | "random" => Ok(LfoWaveform::SampleAndHold),
            _ => Err(SynthError::UnknownLfoWaveform(s.to_string())),
        }
    }
}

/// Low Frequency Oscillator
#[derive(Debug, Clone)]
pub struct Lfo {
    waveform: LfoWaveform,
    rate: f64,
    depth: f64,
    phase: f64,
    /// Last sample-and-hold value
    held: f64,
    /// RNG state for S&H
    rng_state: u64,
}

impl Lfo {
    /// Create a new LFO at phase 0
    pub fn new(waveform: LfoWaveform, rate: f64, depth: f64) -> Self {
        let mut lfo = Self {
            waveform,
            rate: 0.0,
            depth: 0.0,
            phase: 0.0,
            held: 0.0,
            rng_state: 0x9E37_79B9_7F4A_7C15,
        };
        lfo.set_rate(rate);
        lfo.set_depth(depth);
        lfo.held = lfo.random();
        lfo
    }

    /// Set LFO rate in Hz
    pub fn set_rate(&mut self, hz: f64) {
        self.rate = if hz.is_finite() {
            hz.clamp(0.0, MAX_LFO_RATE)
        } else {
            0.0
        };
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Set modulation depth (0.0 to 1.0)
    pub fn set_depth(&mut self, depth: f64) {
        self.depth = if depth.is_finite() {
            depth.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Generate the next raw value (-1.0 to 1.0, not scaled by depth)
    pub fn next_value(&mut self, sample_rate: f64) -> f64 {
        let value = match self.waveform {
            LfoWaveform::Sine => waveform_value(Waveform::Sine, self.phase, 0.5),
            LfoWaveform::Triangle => waveform_value(Waveform::Triangle, self.phase, 0.5),
            LfoWaveform::Square => waveform_value(Waveform::Square, self.phase, 0.5),
            LfoWaveform::SampleAndHold => self.held,
        };

        if sample_rate > 0.0 {
            self.phase += self.rate / sample_rate;
            if self.phase >= 1.0 {
                self.phase = self.phase.fract();
                if self.waveform == LfoWaveform::SampleAndHold {
                    self.held = self.random();
                }
            }
        }

        value
    }

    /// Depth-scaled output. Exactly 0.0 when rate or depth is 0.
    pub fn modulation(&mut self, sample_rate: f64) -> f64 {
        if self.rate == 0.0 || self.depth == 0.0 {
            return 0.0;
        }
        self.next_value(sample_rate) * self.depth
    }

    fn random(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x as f64 / u64::MAX as f64) * 2.0 - 1.0
    }
}
