//! monosynth - a monophonic analog-style subtractive synthesizer
//!
//! One voice made of an oscillator bank (main, sub and noise), a resonant
//! state-variable filter, two ADSR envelopes and an LFO, driven by a voice
//! controller that renders mono blocks on demand.

pub mod config;
pub mod engine;
pub mod error;
pub mod synth;

pub use config::SynthConfig;
pub use engine::{Engine, EngineHandle, SynthEvent};
pub use error::{Result, SynthError};
pub use synth::{PresetParameters, VoiceController};
