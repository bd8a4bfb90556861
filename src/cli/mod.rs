//! CLI interface for monosynth

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Monophonic analog-style subtractive synthesizer
#[derive(Parser)]
#[command(name = "monosynth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a note sequence on the audio output
    Play {
        /// Configuration file path (defaults are used if it does not exist)
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,

        /// Preset to play (overrides the config)
        #[arg(short, long)]
        preset: Option<String>,

        /// Keyboard octave, 2-6 (overrides the config)
        #[arg(short, long)]
        octave: Option<i32>,

        /// Comma-separated note names
        #[arg(short, long, value_delimiter = ',', default_value = "C,E,G,C")]
        notes: Vec<String>,

        /// Seconds each note is held before release
        #[arg(short = 'l', long, default_value = "0.5")]
        note_length: f64,
    },

    /// Render one note offline and print its envelope
    Preview {
        /// Configuration file path (defaults are used if it does not exist)
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,

        /// Preset to render (overrides the config)
        #[arg(short, long)]
        preset: Option<String>,

        /// Note name
        #[arg(short, long, default_value = "A")]
        note: String,

        /// Keyboard octave, 2-6 (overrides the config)
        #[arg(short, long)]
        octave: Option<i32>,

        /// Seconds the note is held
        #[arg(short = 'l', long, default_value = "0.5")]
        note_length: f64,

        /// Seconds rendered after the note is released
        #[arg(short, long, default_value = "1.0")]
        tail: f64,
    },

    /// List factory and user presets
    Presets {
        /// Configuration file path
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
