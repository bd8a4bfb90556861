//! Real-time audio playback using cpal

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig, SupportedBufferSize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Engine;
use crate::config::AudioConfig;

/// Real-time audio player.
///
/// The engine is moved into the output callback; control happens through
/// an [`EngineHandle`](super::EngineHandle) taken before `start`.
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing `engine` on the configured device, or the default one.
    /// Each callback renders one block of `audio.buffer_size` frames when the
    /// device supports that size.
    pub fn start(&mut self, mut engine: Engine, audio: &AudioConfig) -> Result<()> {
        let device = find_output_device(audio.device.as_deref())?;
        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        let buffer_size = choose_buffer_size(audio.buffer_size, config.buffer_size());
        let mut stream_config: StreamConfig = config.into();
        stream_config.buffer_size = buffer_size;

        let device_rate = stream_config.sample_rate.0;
        if device_rate != engine.sample_rate() {
            tracing::info!(
                requested = engine.sample_rate(),
                device = device_rate,
                "using device sample rate"
            );
            engine.set_sample_rate(device_rate);
        }

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, engine, running)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, engine, running)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, engine, running)?,
            other => return Err(anyhow!("Unsupported sample format: {:?}", other)),
        };

        stream.play()?;
        self.stream = Some(stream);

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            channels = stream_config.channels,
            sample_rate = device_rate,
            buffer_size = ?stream_config.buffer_size,
            "audio stream started"
        );
        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if self.stream.take().is_some() {
            tracing::debug!("audio stream stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed block size if the device accepts it, otherwise the device default
fn choose_buffer_size(requested: u32, supported: &SupportedBufferSize) -> BufferSize {
    match *supported {
        SupportedBufferSize::Range { min, max } if (min..=max).contains(&requested) => {
            BufferSize::Fixed(requested)
        }
        SupportedBufferSize::Range { min, max } => {
            tracing::warn!(requested, min, max, "buffer size not supported, using device default");
            BufferSize::Default
        }
        SupportedBufferSize::Unknown => {
            tracing::warn!(requested, "device reports no buffer sizes, using device default");
            BufferSize::Default
        }
    }
}

fn find_output_device(name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available")),
        Some(wanted) => host
            .output_devices()?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| anyhow!("Output device not found: {}", wanted)),
    }
}

fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    mut engine: Engine,
    running: Arc<AtomicBool>,
) -> Result<Stream> {
    let channels = usize::from(config.channels);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if !running.load(Ordering::SeqCst) {
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0f32);
                }
                return;
            }

            // One callback is one block
            engine.begin_block();
            for frame in data.chunks_mut(channels) {
                let sample = engine.next_sample();
                for channel_sample in frame.iter_mut() {
                    *channel_sample = T::from_sample(sample);
                }
            }
        },
        |err| {
            tracing::error!(error = %err, "audio stream error");
        },
        None,
    )?;

    Ok(stream)
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
