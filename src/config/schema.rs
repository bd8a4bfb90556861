//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::synth::{factory_parameters, Preset, MAX_OCTAVE, MIN_OCTAVE};

/// Main configuration for the synth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Master settings (volume, keyboard octave)
    #[serde(default)]
    pub master: MasterConfig,

    /// Preset loaded at startup (factory or user preset name)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// User presets
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl SynthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&self.master.octave) {
            bail!("Octave must be between {} and {}", MIN_OCTAVE, MAX_OCTAVE);
        }

        for (i, preset) in self.presets.iter().enumerate() {
            if preset.name.trim().is_empty() {
                bail!("Preset #{} has an empty name", i + 1);
            }
            if self.presets[..i]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&preset.name))
            {
                bail!("Preset '{}' is defined more than once", preset.name);
            }
        }

        if self.find_preset(&self.preset).is_none() {
            bail!("Preset '{}' is neither a factory nor a user preset", self.preset);
        }

        Ok(())
    }

    /// Look up a preset by name. User presets shadow factory presets.
    pub fn find_preset(&self, name: &str) -> Option<Preset> {
        let name = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
            .or_else(|| {
                factory_parameters(name).map(|params| Preset::new(name.to_ascii_lowercase(), params))
            })
    }

    /// The preset selected by `preset`
    pub fn resolve_preset(&self) -> Result<Preset> {
        match self.find_preset(&self.preset) {
            Some(preset) => Ok(preset),
            None => bail!("Preset '{}' is neither a factory nor a user preset", self.preset),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            master: MasterConfig::default(),
            preset: default_preset(),
            presets: Vec::new(),
        }
    }
}

fn default_preset() -> String {
    "bass".to_string()
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 1024)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> u32 { 1024 }

/// Master settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Master volume 0.0-1.0 (default: 0.25)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Keyboard octave 2-6 (default: 4)
    #[serde(default = "default_octave")]
    pub octave: i32,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            octave: default_octave(),
        }
    }
}

fn default_volume() -> f64 { 0.25 }
fn default_octave() -> i32 { 4 }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{PresetParameters, Waveform};

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 1024); // default
        assert!(config.device.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SynthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolve_preset().unwrap().name, "bass");
    }

    #[test]
    fn test_user_preset_shadows_factory() {
        let yaml = r#"
preset: Acid
presets:
  - name: acid
    waveform: sine
    cutoff: 350
"#;
        let config: SynthConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        let preset = config.resolve_preset().unwrap();
        assert_eq!(preset.parameters.waveform, Waveform::Sine);
        assert_eq!(preset.parameters.cutoff, 350.0);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let config = SynthConfig {
            preset: "theremin".to_string(),
            ..SynthConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(config.resolve_preset().is_err());
    }

    #[test]
    fn test_duplicate_user_presets_rejected() {
        let config = SynthConfig {
            preset: "bass".to_string(),
            presets: vec![
                Preset::new("wobble", PresetParameters::default()),
                Preset::new("Wobble", PresetParameters::default()),
            ],
            ..SynthConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_master_rejected() {
        let mut config = SynthConfig::default();
        config.master.volume = 1.5;
        assert!(config.validate().is_err());

        config.master.volume = 0.5;
        config.master.octave = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_waveform_fails_to_parse() {
        let yaml = r#"
presets:
  - name: broken
    waveform: kazoo
"#;
        assert!(serde_yaml::from_str::<SynthConfig>(yaml).is_err());
    }
}
