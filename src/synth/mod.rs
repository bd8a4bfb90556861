//! Synthesis engine
//!
//! Oscillators, LFO, envelopes and the state-variable filter, wired into a
//! single monophonic voice by the [`VoiceController`].

mod controller;
mod envelope;
mod filter;
mod lfo;
mod note;
mod oscillator;
mod preset;
mod voice;

pub use controller::{ControllerState, VoiceController, DEFAULT_VOLUME};
pub use envelope::{Envelope, EnvelopeParams, EnvelopeStage, LEVEL_EPSILON, MIN_STAGE_TIME};
pub use filter::{
    clamp_cutoff, clamp_resonance, max_cutoff, Filter, FilterOutputs, FilterType, MAX_CUTOFF,
    MAX_RESONANCE, MIN_CUTOFF,
};
pub use lfo::{Lfo, LfoWaveform, MAX_LFO_RATE};
pub use note::{note_name, note_to_frequency, parse_note_name, MAX_OCTAVE, MIN_OCTAVE};
pub use oscillator::{waveform_value, NoiseSource, Oscillator, Waveform, MAX_FREQUENCY};
pub use preset::{
    factory_parameters, factory_presets, find_preset, Preset, PresetParameters,
    FACTORY_PRESET_NAMES,
};
pub use voice::Voice;
