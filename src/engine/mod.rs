//! Audio engine
//!
//! Wraps the [`VoiceController`] for the render thread. Control events
//! arrive over a channel from any number of [`EngineHandle`]s and are
//! applied only at block boundaries, so a block always renders from one
//! consistent snapshot.

mod player;

pub use player::{default_device_name, list_output_devices, Player};

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Result;

use crate::config::SynthConfig;
use crate::synth::{ControllerState, PresetParameters, VoiceController};

/// Control events sent to the render thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthEvent {
    /// Semitone (0-11) and octave (2-6)
    NoteOn { note: i32, octave: i32 },
    NoteOnFrequency(f64),
    NoteOff,
    SetParameters(PresetParameters),
    SetMasterVolume(f64),
    /// Release the current note and let it fade out
    StopAll,
    /// Silence immediately
    HardStop,
}

/// Cloneable sender side of the engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: Sender<SynthEvent>,
}

impl EngineHandle {
    /// Send a raw event
    pub fn send(&self, event: SynthEvent) -> Result<()> {
        self.sender.send(event)?;
        Ok(())
    }

    pub fn note_on(&self, note: i32, octave: i32) -> Result<()> {
        self.send(SynthEvent::NoteOn { note, octave })
    }

    pub fn note_off(&self) -> Result<()> {
        self.send(SynthEvent::NoteOff)
    }

    pub fn set_parameters(&self, params: PresetParameters) -> Result<()> {
        self.send(SynthEvent::SetParameters(params))
    }

    pub fn set_master_volume(&self, volume: f64) -> Result<()> {
        self.send(SynthEvent::SetMasterVolume(volume))
    }

    pub fn stop_all(&self) -> Result<()> {
        self.send(SynthEvent::StopAll)
    }

    pub fn hard_stop(&self) -> Result<()> {
        self.send(SynthEvent::HardStop)
    }
}

/// The render-side engine
pub struct Engine {
    controller: VoiceController,
    events: Receiver<SynthEvent>,
    sender: Sender<SynthEvent>,
    sample_rate: u32,
}

impl Engine {
    /// Create an engine for `sample_rate` starting from `params`
    pub fn new(params: PresetParameters, sample_rate: u32) -> Self {
        let (sender, events) = mpsc::channel();
        Self {
            controller: VoiceController::new(params),
            events,
            sender,
            sample_rate,
        }
    }

    /// Create an engine from a validated configuration
    pub fn from_config(config: &SynthConfig) -> Result<Self> {
        let preset = config.resolve_preset()?;
        let mut engine = Self::new(preset.parameters, config.audio.sample_rate);
        engine.controller.set_master_volume(config.master.volume);
        tracing::info!(
            preset = %preset.name,
            sample_rate = config.audio.sample_rate,
            "engine ready"
        );
        Ok(engine)
    }

    /// A new handle for sending control events
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Change the render sample rate (e.g. to match the output device)
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    pub fn controller(&self) -> &VoiceController {
        &self.controller
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Apply every queued event and pending parameter change.
    /// Call once at the start of each block.
    pub fn begin_block(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
        self.controller.apply_pending();
    }

    fn apply(&mut self, event: SynthEvent) {
        match event {
            SynthEvent::NoteOn { note, octave } => self.controller.note_on(note, octave),
            SynthEvent::NoteOnFrequency(hz) => self.controller.note_on_frequency(hz),
            SynthEvent::NoteOff => self.controller.note_off(),
            SynthEvent::SetParameters(params) => self.controller.set_parameters(params),
            SynthEvent::SetMasterVolume(volume) => self.controller.set_master_volume(volume),
            SynthEvent::StopAll => self.controller.stop_all(),
            SynthEvent::HardStop => self.controller.hard_stop(),
        }
    }

    /// Generate the next sample (no event handling)
    pub fn next_sample(&mut self) -> f32 {
        self.controller.render_sample(f64::from(self.sample_rate))
    }

    /// Fill a buffer with one block of samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        self.begin_block();
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Render `frame_count` samples as a new block
    pub fn render_block(&mut self, frame_count: usize) -> Vec<f32> {
        let mut block = vec![0.0; frame_count];
        self.fill_buffer(&mut block);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{find_preset, EnvelopeParams};

    fn test_engine() -> Engine {
        let params = PresetParameters {
            amp_envelope: EnvelopeParams::new(0.005, 0.05, 0.6, 0.02),
            ..PresetParameters::default()
        };
        Engine::new(params, 44100)
    }

    #[test]
    fn test_engine_creation() {
        let engine = test_engine();
        assert_eq!(engine.sample_rate(), 44100);
        assert_eq!(engine.state(), ControllerState::Idle);
    }

    #[test]
    fn test_events_wait_for_block_boundary() {
        let mut engine = test_engine();
        let handle = engine.handle();

        handle.note_on(0, 4).unwrap();
        // Not applied yet: per-sample rendering does not read the queue
        assert_eq!(engine.next_sample(), 0.0);
        assert_eq!(engine.state(), ControllerState::Idle);

        let block = engine.render_block(1024);
        assert_eq!(engine.state(), ControllerState::Sounding);
        assert!(block.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_handle_from_another_thread() {
        let mut engine = test_engine();
        let handle = engine.handle();

        std::thread::spawn(move || {
            handle.note_on(9, 4).unwrap();
            handle.note_off().unwrap();
        })
        .join()
        .unwrap();

        engine.begin_block();
        assert_eq!(engine.state(), ControllerState::Releasing);
    }

    #[test]
    fn test_parameter_event() {
        let mut engine = test_engine();
        let acid = find_preset("acid").unwrap().parameters;
        engine.handle().set_parameters(acid).unwrap();

        engine.begin_block();
        assert_eq!(engine.controller().parameters().cutoff, 500.0);
    }

    #[test]
    fn test_stop_all_then_hard_stop() {
        let mut engine = test_engine();
        let handle = engine.handle();
        handle.note_on(0, 4).unwrap();
        engine.render_block(2048);

        handle.stop_all().unwrap();
        engine.render_block(16);
        assert_eq!(engine.state(), ControllerState::Releasing);

        handle.hard_stop().unwrap();
        let block = engine.render_block(64);
        assert_eq!(engine.state(), ControllerState::Idle);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_from_config() {
        let config = SynthConfig::default();
        let engine = Engine::from_config(&config).unwrap();
        assert_eq!(engine.controller().parameters().cutoff, 800.0);
        assert_eq!(engine.controller().master_volume(), 0.25);
    }
}
