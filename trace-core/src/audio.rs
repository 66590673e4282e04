//! # Audio Capture Module
//!
//! Real-time microphone capture via CPAL. Captured samples are accumulated
//! into fixed-size mono blocks and handed to the analysis side over a
//! bounded channel; a full channel drops blocks rather than stalling the
//! audio callback.

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

use crate::pitch::BLOCK_SIZE;

/// Preferred capture rate. The detector works at whatever rate the device
/// actually provides; this only steers config selection.
const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts capture from the default input device.
///
/// Returns the live stream handle (capture stops when it is dropped) and the
/// negotiated sample rate. Multi-channel devices are downmixed to mono by
/// averaging, so the detector always sees one sample per frame.
pub fn start_capture(sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    println!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No f32 input format found"))?;
    let channels = supported_config.channels() as usize;

    let sample_rate = clamp_sample_rate(&supported_config, TARGET_SAMPLE_RATE);
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));

    let sample_rate_val = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    println!(
        "[AUDIO] Capturing at {} Hz, {} channel(s)",
        sample_rate_val, channels
    );

    let err_fn = |err| eprintln!("[AUDIO] Stream error: {}", err);

    // Accumulates mono samples across callbacks until a full block is ready.
    let mut block_buffer = Vec::with_capacity(BLOCK_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if channels == 1 {
                block_buffer.extend_from_slice(data);
            } else {
                block_buffer.extend(
                    data.chunks_exact(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }

            while block_buffer.len() >= BLOCK_SIZE {
                let block = block_buffer[..BLOCK_SIZE].to_vec();
                // Drop the block if the analysis side is behind.
                let _ = sender.try_send(block);
                block_buffer.drain(..BLOCK_SIZE);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Picks the input configuration closest to the target rate, preferring mono.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    let rate_distance = |c: &SupportedStreamConfigRange| {
        let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
        let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
        min_diff.min(max_diff)
    };

    let f32_configs: Vec<_> = configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .collect();

    f32_configs
        .iter()
        .filter(|c| c.channels() == 1)
        .min_by_key(|c| rate_distance(c))
        .or_else(|| f32_configs.iter().min_by_key(|c| rate_distance(c)))
        .cloned()
}

/// The target rate when the device range allows it, otherwise the nearest
/// rate the range does allow.
fn clamp_sample_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}
