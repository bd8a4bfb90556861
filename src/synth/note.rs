//! Keyboard note to frequency mapping

use crate::error::{Result, SynthError};

/// Octave range of the keyboard
pub const MIN_OCTAVE: i32 = 2;
pub const MAX_OCTAVE: i32 = 6;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Frequency of semitone `note` (0-11) in `octave` (2-6).
///
/// The key number is `octave * 12 + note`, with key 69 tuned to 440 Hz.
/// Out-of-range arguments are clamped.
pub fn note_to_frequency(note: i32, octave: i32) -> f64 {
    let note = note.clamp(0, 11);
    let octave = octave.clamp(MIN_OCTAVE, MAX_OCTAVE);
    let key = octave * 12 + note;
    440.0 * ((key - 69) as f64 / 12.0).exp2()
}

/// Parse a note name such as `C`, `f#` or `Bb` into a semitone 0-11
pub fn parse_note_name(name: &str) -> Result<i32> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(SynthError::InvalidNoteName(name.to_string())),
    };

    let mut semitone: i32 = base;
    for accidental in chars {
        match accidental {
            '#' => semitone += 1,
            'b' => semitone -= 1,
            _ => return Err(SynthError::InvalidNoteName(name.to_string())),
        }
    }

    Ok(semitone.rem_euclid(12))
}

/// Display name of semitone `note`
pub fn note_name(note: i32) -> &'static str {
    NOTE_NAMES[note.rem_euclid(12) as usize]
}
