//! monosynth - monophonic analog-style subtractive synthesizer

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use monosynth::config::{self, SynthConfig};
use monosynth::engine::{self, Engine, Player};
use monosynth::synth::{factory_presets, note_name, parse_note_name, EnvelopeStage, Preset};

mod cli;

use cli::{Cli, Commands};

/// Width of one line of `preview` output in seconds
const PREVIEW_WINDOW: f64 = 0.05;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            preset,
            octave,
            notes,
            note_length,
        } => {
            let cfg = load_with_overrides(&config_path, preset, octave)?;
            if !(note_length.is_finite() && note_length > 0.0) {
                bail!("Note length must be a positive number of seconds");
            }
            let notes = notes
                .iter()
                .map(|name| parse_note_name(name))
                .collect::<Result<Vec<_>, _>>()?;

            let preset = cfg.resolve_preset()?;
            let release = preset.parameters.amp_envelope.release;
            let octave = cfg.master.octave;

            println!("Playing preset '{}' in octave {}", preset.name, octave);
            println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
            println!("  Buffer size: {}", cfg.audio.buffer_size);
            println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
            println!("Press Ctrl-C to stop.");

            let engine = Engine::from_config(&cfg)?;
            let handle = engine.handle();

            let mut player = Player::new();
            player.start(engine, &cfg.audio)?;

            let interrupted = Arc::new(AtomicBool::new(false));
            {
                let interrupted = interrupted.clone();
                let handle = handle.clone();
                ctrlc::set_handler(move || {
                    interrupted.store(true, Ordering::SeqCst);
                    if let Err(e) = handle.stop_all() {
                        tracing::warn!(error = %e, "could not send stop");
                    }
                })?;
            }

            for note in notes {
                if interrupted.load(Ordering::SeqCst) {
                    break;
                }
                println!("  {}{}", note_name(note), octave);
                handle.note_on(note, octave)?;
                sleep_unless(&interrupted, note_length);
                handle.note_off()?;
            }

            handle.stop_all()?;
            // Let the release tail ring out
            std::thread::sleep(Duration::from_secs_f64(release + 0.1));
            player.stop();
            println!("Done.");
        }

        Commands::Preview {
            config: config_path,
            preset,
            note,
            octave,
            note_length,
            tail,
        } => {
            let cfg = load_with_overrides(&config_path, preset, octave)?;
            if !(note_length.is_finite() && note_length > 0.0) {
                bail!("Note length must be a positive number of seconds");
            }
            if !(tail.is_finite() && tail >= 0.0) {
                bail!("Tail must be zero or a positive number of seconds");
            }
            let note = parse_note_name(&note)?;
            let octave = cfg.master.octave;

            let mut engine = Engine::from_config(&cfg)?;
            let handle = engine.handle();
            let window = ((f64::from(cfg.audio.sample_rate) * PREVIEW_WINDOW).round() as usize).max(1);
            let held = (note_length / PREVIEW_WINDOW).ceil() as usize;
            let total = held + (tail / PREVIEW_WINDOW).ceil() as usize;

            println!(
                "Preview of '{}' playing {}{} ({} Hz)",
                cfg.preset,
                note_name(note),
                octave,
                cfg.audio.sample_rate
            );
            println!("{:>7}  {:<8}  {:>6}  {:>6}", "time", "stage", "env", "peak");

            handle.note_on(note, octave)?;
            for i in 0..total {
                if i == held {
                    handle.note_off()?;
                }
                let block = engine.render_block(window);
                let peak = block.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
                let stage = engine
                    .controller()
                    .voice()
                    .map_or(EnvelopeStage::Idle, |voice| voice.amp_envelope().stage());
                println!(
                    "{:>6.2}s  {:<8}  {:>6.3}  {:>6.3}  {}",
                    (i + 1) as f64 * PREVIEW_WINDOW,
                    format!("{:?}", stage),
                    engine.controller().amp_level(),
                    peak,
                    "#".repeat((peak * 40.0).round() as usize)
                );
                if i > held && !engine.controller().is_active() {
                    break;
                }
            }
        }

        Commands::Presets { config: config_path } => {
            let cfg = load_or_default(&config_path)?;

            println!("Factory presets:");
            for preset in factory_presets() {
                print_preset(&preset);
            }
            if !cfg.presets.is_empty() {
                println!("\nUser presets ({:?}):", config_path);
                for preset in &cfg.presets {
                    print_preset(preset);
                }
            }
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            if let Some(name) = engine::default_device_name() {
                println!("Default output: {}\n", name);
            }

            println!("Output devices:");
            let devices = engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none found)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    if let Some(device) = &cfg.audio.device {
                        println!("  Device: {}", device);
                    }
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!("  Octave: {}", cfg.master.octave);
                    println!("  Preset: {}", cfg.preset);
                    println!("  User presets: {}", cfg.presets.len());
                    for preset in &cfg.presets {
                        println!("    - {}", preset.name);
                    }
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = "monosynth.yaml";
            if Path::new(path).exists() {
                println!("monosynth.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_CONFIG)?;
                println!("Created monosynth.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Load the config file, or fall back to defaults when it does not exist
fn load_or_default(path: &Path) -> Result<SynthConfig> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::info!(path = ?path, "no config file, using defaults");
        Ok(SynthConfig::default())
    }
}

fn load_with_overrides(
    path: &Path,
    preset: Option<String>,
    octave: Option<i32>,
) -> Result<SynthConfig> {
    let mut cfg = load_or_default(path)?;
    if let Some(preset) = preset {
        cfg.preset = preset;
    }
    if let Some(octave) = octave {
        cfg.master.octave = octave;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn print_preset(preset: &Preset) {
    let p = &preset.parameters;
    println!(
        "  {:<12} {:<9} {:<9} cutoff {:>6.0} Hz  Q {:>4.1}  ADSR {}/{}/{}/{}",
        preset.name,
        p.waveform,
        p.filter_type,
        p.cutoff,
        p.resonance,
        p.amp_envelope.attack,
        p.amp_envelope.decay,
        p.amp_envelope.sustain,
        p.amp_envelope.release
    );
}

/// Sleep for `seconds`, waking early if `flag` is set
fn sleep_unless(flag: &AtomicBool, seconds: f64) {
    let deadline = Instant::now() + Duration::from_secs_f64(seconds);
    while !flag.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(Duration::from_millis(10)));
    }
}
