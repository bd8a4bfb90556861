//! Monophonic voice controller
//!
//! Owns at most one [`Voice`]. A note-on while a voice exists retunes it
//! instead of starting a second one, and the voice is only dropped once its
//! amplitude envelope has released to zero.

use super::note::note_to_frequency;
use super::oscillator::NoiseSource;
use super::preset::PresetParameters;
use super::voice::Voice;

/// Default master volume
pub const DEFAULT_VOLUME: f64 = 0.25;

/// Pre-saturation gain of the output stage
const OUTPUT_DRIVE: f64 = 1.5;

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Sounding,
    Releasing,
}

/// Drives the single voice from note events and renders audio
#[derive(Debug, Clone)]
pub struct VoiceController {
    params: PresetParameters,
    pending: Option<PresetParameters>,
    master_volume: f64,
    voice: Option<Voice>,
    /// Noise generator between voices, so each note continues the sequence
    noise: NoiseSource,
    state: ControllerState,
}

impl VoiceController {
    pub fn new(params: PresetParameters) -> Self {
        Self {
            params: params.clamped(),
            pending: None,
            master_volume: DEFAULT_VOLUME,
            voice: None,
            noise: NoiseSource::default(),
            state: ControllerState::Idle,
        }
    }

    /// Queue new parameters. They replace the live set at the next block.
    pub fn set_parameters(&mut self, params: PresetParameters) {
        self.pending = Some(params.clamped());
    }

    /// Live parameters (pending ones are not visible until applied)
    pub fn parameters(&self) -> &PresetParameters {
        &self.params
    }

    /// Apply queued parameters. Called at every block boundary.
    pub fn apply_pending(&mut self) {
        if let Some(params) = self.pending.take() {
            self.params = params;
            if let Some(voice) = self.voice.as_mut() {
                voice.apply_parameters(&self.params);
            }
            tracing::debug!(
                waveform = %params.waveform,
                cutoff = params.cutoff,
                resonance = params.resonance,
                "parameters applied"
            );
        }
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    /// Key press: semitone `note` (0-11) in `octave` (2-6)
    pub fn note_on(&mut self, note: i32, octave: i32) {
        self.note_on_frequency(note_to_frequency(note, octave));
    }

    /// Key press at an explicit frequency in Hz
    pub fn note_on_frequency(&mut self, frequency: f64) {
        match self.voice.as_mut() {
            Some(voice) => {
                voice.retrigger(frequency);
                tracing::trace!(frequency = voice.frequency(), "voice retriggered");
            }
            None => {
                let voice = Voice::with_noise(frequency, &self.params, self.noise.clone());
                tracing::trace!(frequency = voice.frequency(), "voice started");
                self.voice = Some(voice);
            }
        }
        self.state = ControllerState::Sounding;
    }

    /// Key release. The voice keeps sounding through its release stage.
    pub fn note_off(&mut self) {
        if let Some(voice) = self.voice.as_mut() {
            voice.release();
            self.state = ControllerState::Releasing;
            tracing::trace!("voice releasing");
        }
    }

    /// Release whatever is playing and let it fade out
    pub fn stop_all(&mut self) {
        tracing::debug!("stop all");
        self.note_off();
    }

    /// Silence immediately. The only path that skips the release stage.
    pub fn hard_stop(&mut self) {
        if self.drop_voice() {
            tracing::debug!("hard stop");
        }
        self.state = ControllerState::Idle;
    }

    fn drop_voice(&mut self) -> bool {
        match self.voice.take() {
            Some(voice) => {
                self.noise = voice.into_noise();
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != ControllerState::Idle
    }

    /// Number of live voices, never more than one
    pub fn voice_count(&self) -> usize {
        usize::from(self.voice.is_some())
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Current amplitude envelope level, 0 when idle
    pub fn amp_level(&self) -> f64 {
        self.voice
            .as_ref()
            .map_or(0.0, |voice| voice.amp_envelope().level())
    }

    /// Render one sample
    pub fn render_sample(&mut self, sample_rate: f64) -> f32 {
        if !(sample_rate > 0.0) {
            return 0.0;
        }
        let Some(voice) = self.voice.as_mut() else {
            return 0.0;
        };

        let sample = voice.render(&self.params, sample_rate);
        let finished = voice.is_finished();

        if self.state == ControllerState::Releasing && finished {
            self.drop_voice();
            self.state = ControllerState::Idle;
            tracing::trace!("voice finished");
        }

        ((sample * OUTPUT_DRIVE).tanh() * self.master_volume) as f32
    }

    /// Fill `buffer` with mono samples without allocating
    pub fn render_into(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.apply_pending();
        let sample_rate = f64::from(sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.render_sample(sample_rate);
        }
    }

    /// Render `frame_count` mono samples
    pub fn render_block(&mut self, frame_count: usize, sample_rate: u32) -> Vec<f32> {
        let mut block = vec![0.0; frame_count];
        self.render_into(&mut block, sample_rate);
        block
    }
}

impl Default for VoiceController {
    fn default() -> Self {
        Self::new(PresetParameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::envelope::{EnvelopeParams, EnvelopeStage};

    const SR: u32 = 44100;

    fn quick() -> PresetParameters {
        PresetParameters {
            amp_envelope: EnvelopeParams::new(0.005, 0.02, 0.5, 0.02),
            filter_envelope: EnvelopeParams::new(0.005, 0.02, 0.5, 0.02),
            ..PresetParameters::default()
        }
    }

    #[test]
    fn test_idle_renders_silence() {
        let mut synth = VoiceController::default();
        assert_eq!(synth.state(), ControllerState::Idle);
        let block = synth.render_block(512, SR);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_note_on_sounds() {
        let mut synth = VoiceController::new(quick());
        synth.note_on(9, 4);
        assert_eq!(synth.state(), ControllerState::Sounding);
        assert_eq!(synth.voice_count(), 1);

        let block = synth.render_block(2048, SR);
        assert!(block.iter().any(|&s| s.abs() > 0.01));
    }

    #[test]
    fn test_note_off_releases_then_idles() {
        let mut synth = VoiceController::new(quick());
        synth.note_on(0, 4);
        synth.render_block(2048, SR);

        synth.note_off();
        assert_eq!(synth.state(), ControllerState::Releasing);
        assert_eq!(synth.voice_count(), 1);

        synth.render_block(4410, SR);
        assert_eq!(synth.state(), ControllerState::Idle);
        assert_eq!(synth.voice_count(), 0);
        assert!(synth.render_block(256, SR).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_note_off_when_idle_is_noop() {
        let mut synth = VoiceController::default();
        synth.note_off();
        assert_eq!(synth.state(), ControllerState::Idle);
    }

    #[test]
    fn test_retrigger_while_releasing() {
        let mut synth = VoiceController::new(quick());
        synth.note_on(0, 4);
        synth.render_block(2048, SR);
        synth.note_off();
        synth.render_block(100, SR);

        synth.note_on(7, 4);
        assert_eq!(synth.state(), ControllerState::Sounding);
        assert_eq!(synth.voice_count(), 1);
        let voice = synth.voice().unwrap();
        assert_eq!(voice.amp_envelope().stage(), EnvelopeStage::Attack);
        assert!((voice.frequency() - note_to_frequency(7, 4)).abs() < 1e-9);
    }

    #[test]
    fn test_parameters_apply_at_block_boundary() {
        let mut synth = VoiceController::default();
        let changed = PresetParameters {
            cutoff: 500.0,
            ..PresetParameters::default()
        };
        synth.set_parameters(changed);
        assert_eq!(synth.parameters().cutoff, 2000.0);

        synth.render_block(1, SR);
        assert_eq!(synth.parameters().cutoff, 500.0);
    }

    #[test]
    fn test_set_parameters_clamps() {
        let mut synth = VoiceController::default();
        synth.set_parameters(PresetParameters {
            resonance: 1000.0,
            cutoff: -5.0,
            ..PresetParameters::default()
        });
        synth.apply_pending();
        assert_eq!(synth.parameters().resonance, 30.0);
        assert_eq!(synth.parameters().cutoff, 20.0);
    }

    #[test]
    fn test_stop_all_fades_out() {
        let mut synth = VoiceController::new(quick());
        synth.note_on(0, 4);
        synth.render_block(2048, SR);

        synth.stop_all();
        assert_eq!(synth.state(), ControllerState::Releasing);
        let tail = synth.render_block(8, SR);
        assert!(tail.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_hard_stop_is_immediate() {
        let mut synth = VoiceController::new(quick());
        synth.note_on(0, 4);
        synth.render_block(2048, SR);

        synth.hard_stop();
        assert_eq!(synth.state(), ControllerState::Idle);
        assert_eq!(synth.voice_count(), 0);
        assert!(synth.render_block(64, SR).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_master_volume_bounds_output() {
        let mut synth = VoiceController::new(quick());
        synth.set_master_volume(0.1);
        synth.note_on(0, 4);
        let block = synth.render_block(4096, SR);
        assert!(block.iter().all(|&s| s.abs() <= 0.1));

        synth.set_master_volume(4.0);
        assert_eq!(synth.master_volume(), 1.0);
    }

    #[test]
    fn test_noise_continues_across_notes() {
        let noisy = PresetParameters {
            noise_level: 1.0,
            sub_osc_level: 0.0,
            ..quick()
        };
        let mut synth = VoiceController::new(noisy);

        synth.note_on(0, 4);
        let first = synth.render_block(512, SR);
        synth.hard_stop();

        synth.note_on(0, 4);
        let second = synth.render_block(512, SR);
        synth.note_off();
        synth.render_block(4410, SR);
        assert_eq!(synth.state(), ControllerState::Idle);

        synth.note_on(0, 4);
        let third = synth.render_block(512, SR);

        assert!(first.iter().any(|&s| s != 0.0));
        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn test_zero_sample_rate_is_silent() {
        let mut synth = VoiceController::new(quick());
        synth.note_on(0, 4);
        assert!(synth.render_block(64, 0).iter().all(|&s| s == 0.0));
        assert_eq!(synth.state(), ControllerState::Sounding);
    }
}
