//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Example configuration written by `monosynth init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../monosynth.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<SynthConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    let config: SynthConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    tracing::debug!(path = ?path, preset = %config.preset, "config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Waveform;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
audio:
  sample_rate: 44100
  buffer_size: 512

master:
  volume: 0.7
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.master.volume, 0.7);
        assert_eq!(config.master.octave, 4);
        assert_eq!(config.preset, "bass");
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"audio:\n  sample_rate: 100\n").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_config(Path::new("/nonexistent/monosynth.yaml")).is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: SynthConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();

        let wobble = config.find_preset("wobble").unwrap();
        assert_eq!(wobble.parameters.waveform, Waveform::Sawtooth);
    }
}
