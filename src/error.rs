//! Error type for the text boundaries of the synth (config files, CLI).
//!
//! The render path itself never fails: out-of-range values are clamped.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    #[error("unknown waveform '{0}'")]
    UnknownWaveform(String),

    #[error("unknown filter type '{0}'")]
    UnknownFilterType(String),

    #[error("unknown LFO waveform '{0}'")]
    UnknownLfoWaveform(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("invalid note name '{0}'")]
    InvalidNoteName(String),
}

pub type Result<T> = std::result::Result<T, SynthError>;
