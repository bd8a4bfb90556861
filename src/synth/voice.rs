//! Per-note synthesis graph
//!
//! oscillator + sub-oscillator + noise -> filter -> amplitude envelope.
//! Cutoff is re-derived every sample from the base cutoff, the filter
//! envelope and the LFO.

use super::envelope::{Envelope, EnvelopeStage};
use super::filter::Filter;
use super::lfo::Lfo;
use super::oscillator::{NoiseSource, Oscillator};
use super::preset::PresetParameters;

/// The complete state of the one sounding note
#[derive(Debug, Clone)]
pub struct Voice {
    frequency: f64,
    oscillator: Oscillator,
    sub_oscillator: Oscillator,
    noise: NoiseSource,
    filter: Filter,
    amp_envelope: Envelope,
    filter_envelope: Envelope,
    lfo: Lfo,
}

impl Voice {
    /// Fresh voice: phases at zero, both envelopes starting their attack
    pub fn new(frequency: f64, params: &PresetParameters) -> Self {
        Self::with_noise(frequency, params, NoiseSource::default())
    }

    /// Fresh voice continuing an existing noise sequence
    pub fn with_noise(frequency: f64, params: &PresetParameters, noise: NoiseSource) -> Self {
        let mut voice = Self {
            frequency: 0.0,
            oscillator: Oscillator::new(params.waveform, frequency),
            sub_oscillator: Oscillator::sub(frequency),
            noise,
            filter: Filter::new(params.filter_type),
            amp_envelope: Envelope::new(params.amp_envelope),
            filter_envelope: Envelope::new(params.filter_envelope),
            lfo: Lfo::new(params.lfo_waveform, params.lfo_rate, params.lfo_depth),
        };
        voice.tune(frequency);
        voice.apply_parameters(params);
        voice.amp_envelope.note_on();
        voice.filter_envelope.note_on();
        voice
    }

    /// Retune in place (phases preserved) and restart both envelopes
    pub fn retrigger(&mut self, frequency: f64) {
        self.tune(frequency);
        self.amp_envelope.note_on();
        self.filter_envelope.note_on();
    }

    /// Move both envelopes to their release stage
    pub fn release(&mut self) {
        self.amp_envelope.note_off();
        self.filter_envelope.note_off();
    }

    /// Push new settings into the running components without resetting them
    pub fn apply_parameters(&mut self, params: &PresetParameters) {
        self.oscillator.set_waveform(params.waveform);
        self.oscillator.set_pulse_width(params.pulse_width);
        self.oscillator.set_detune(params.detune_cents);
        self.sub_oscillator.set_detune(params.detune_cents);
        self.filter.set_type(params.filter_type);
        self.amp_envelope.set_params(params.amp_envelope);
        self.filter_envelope.set_params(params.filter_envelope);
        self.lfo.set_waveform(params.lfo_waveform);
        self.lfo.set_rate(params.lfo_rate);
        self.lfo.set_depth(params.lfo_depth);
    }

    fn tune(&mut self, frequency: f64) {
        self.oscillator.set_frequency(frequency);
        self.frequency = self.oscillator.frequency();
        self.sub_oscillator.set_frequency(self.frequency * 0.5);
    }

    /// Cutoff for the current sample given an LFO modulation value
    pub fn modulated_cutoff(&self, params: &PresetParameters, lfo_modulation: f64) -> f64 {
        params.cutoff
            + params.filter_env_amount * self.filter_envelope.level()
            + lfo_modulation * params.cutoff
    }

    /// Produce one enveloped sample and advance every component
    pub fn render(&mut self, params: &PresetParameters, sample_rate: f64) -> f64 {
        let mut mix = self.oscillator.next_sample(sample_rate);
        let sub = self.sub_oscillator.next_sample(sample_rate);
        if params.sub_osc_level > 0.0 {
            mix = mix * (1.0 - params.sub_osc_level) + sub * params.sub_osc_level;
        }
        if params.noise_level > 0.0 {
            let noise = self.noise.next_sample();
            mix = mix * (1.0 - params.noise_level) + noise * params.noise_level;
        }

        let lfo_modulation = self.lfo.modulation(sample_rate);
        let cutoff = self.modulated_cutoff(params, lfo_modulation);
        let filtered = self.filter.process(mix, cutoff, params.resonance, sample_rate);

        let output = filtered * self.amp_envelope.level();

        let dt = 1.0 / sample_rate;
        self.amp_envelope.tick(dt);
        self.filter_envelope.tick(dt);

        output
    }

    /// True once the amplitude envelope has fully released
    pub fn is_finished(&self) -> bool {
        self.amp_envelope.stage() == EnvelopeStage::Idle
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn sub_oscillator(&self) -> &Oscillator {
        &self.sub_oscillator
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn amp_envelope(&self) -> &Envelope {
        &self.amp_envelope
    }

    pub fn filter_envelope(&self) -> &Envelope {
        &self.filter_envelope
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    /// Tear down the voice, keeping its noise generator
    pub fn into_noise(self) -> NoiseSource {
        self.noise
    }
}
