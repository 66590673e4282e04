//! # Frequency Math Module
//!
//! MIDI note number <-> frequency conversions and cents deviation, based on
//! equal temperament with A4 = MIDI 69 = 440 Hz. These are the shared
//! primitives behind the theory engine, the layout mapper and the drone.

/// Converts a (possibly fractional) MIDI note number to a frequency in Hz.
///
/// Accepts fractional input so callers can position pitches with
/// cents-accurate resolution.
pub fn frequency_from_midi(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Converts a frequency in Hz to the nearest integer MIDI note number.
pub fn midi_from_frequency(freq: f32) -> i32 {
    (12.0 * (freq / 440.0).log2() + 69.0).round() as i32
}

/// Deviation of `freq` from the given MIDI note, in cents.
///
/// Negative values are flat, positive values are sharp. An exactly in-tune
/// frequency yields 0.
pub fn cents_offset(freq: f32, reference_midi: i32) -> i32 {
    (1200.0 * (freq / frequency_from_midi(reference_midi as f32)).log2()).floor() as i32
}
