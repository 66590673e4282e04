//! # Drone Module
//!
//! A continuously sounding reference tone at the selected tonic, generated
//! as a band-unlimited sawtooth on the default output device. The tone keeps
//! playing while the tonic or octave changes; parameter updates go through a
//! shared cell read by the output callback, so there is no glitchy stream
//! rebuild on every change.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::freq;
use crate::theory::Tonic;

/// MIDI note of C in the reference octave (octave 3).
const BASE_MIDI_C3: i32 = 48;

pub const MIN_OCTAVE: u8 = 2;
pub const MAX_OCTAVE: u8 = 4;
pub const DEFAULT_OCTAVE: u8 = 3;
pub const DEFAULT_VOLUME: f32 = 0.25;

/// Frequency of a tonic sounded in the given drone octave.
pub fn tonic_frequency(tonic: Tonic, octave: u8) -> f32 {
    let midi = BASE_MIDI_C3 + tonic.pitch_class() as i32 + (octave as i32 - 3) * 12;
    freq::frequency_from_midi(midi as f32)
}

#[derive(Debug, Clone, Copy)]
struct DroneParams {
    frequency: f32,
    gain: f32,
}

/// A running drone. Dropping it stops the sound.
pub struct Drone {
    _stream: cpal::Stream,
    params: Arc<Mutex<DroneParams>>,
}

impl Drone {
    /// Starts the drone on the default output device.
    pub fn start(frequency: f32, gain: f32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;

        println!("[DRONE] Using output device: {}", device.name()?);

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        let config: cpal::StreamConfig = config.into();

        let params = Arc::new(Mutex::new(DroneParams { frequency, gain }));
        let callback_params = Arc::clone(&params);

        let err_fn = |err| eprintln!("[DRONE] Stream error: {}", err);

        // Phase in [0, 1); advanced per output frame by freq / sample_rate.
        let mut phase = 0.0f32;

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let current = match callback_params.lock() {
                    Ok(guard) => *guard,
                    Err(_) => {
                        data.fill(0.0);
                        return;
                    }
                };
                let step = current.frequency / sample_rate;
                for frame in data.chunks_mut(channels) {
                    // Sawtooth in [-1, 1].
                    let sample = (2.0 * phase - 1.0) * current.gain;
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                    phase += step;
                    if phase >= 1.0 {
                        phase -= 1.0;
                    }
                }
            },
            err_fn,
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            params,
        })
    }

    pub fn set_frequency(&self, frequency: f32) {
        if let Ok(mut guard) = self.params.lock() {
            guard.frequency = frequency;
        }
    }

    pub fn set_gain(&self, gain: f32) {
        if let Ok(mut guard) = self.params.lock() {
            guard.gain = gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonic_frequencies_match_equal_temperament() {
        // C3 is MIDI 48, ~130.81 Hz.
        assert!((tonic_frequency(Tonic::C, 3) - 130.81).abs() < 0.01);
        // A3 is exactly 220 Hz.
        assert!((tonic_frequency(Tonic::A, 3) - 220.0).abs() < 1e-3);
        // Octave 4 doubles octave 3.
        let c3 = tonic_frequency(Tonic::C, 3);
        let c4 = tonic_frequency(Tonic::C, 4);
        assert!((c4 / c3 - 2.0).abs() < 1e-4);
    }

    #[test]
    fn enharmonic_tonics_share_a_frequency() {
        for octave in MIN_OCTAVE..=MAX_OCTAVE {
            assert_eq!(
                tonic_frequency(Tonic::CSharp, octave),
                tonic_frequency(Tonic::DFlat, octave)
            );
            assert_eq!(
                tonic_frequency(Tonic::GSharp, octave),
                tonic_frequency(Tonic::AFlat, octave)
            );
        }
    }
}
