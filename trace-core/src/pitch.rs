//! # Pitch Detection Module
//!
//! Converts a single block of audio samples into a frequency estimate using
//! time-domain autocorrelation with parabolic refinement.
//!
//! ## Behavior
//! - Silence and aperiodic noise produce an *unvoiced* estimate, never an
//!   error: the RMS gate is the only thing that suppresses spurious output.
//! - The double loop over lags is O(n²) in the block length; blocks are kept
//!   at a fixed 2048 samples so per-tick latency stays small and predictable.
//! - A flat interpolation vertex or a peak at the block boundary falls back
//!   to the unrefined integer lag.

/// Samples per analysis block. Power of two, ~46 ms at 44.1 kHz.
pub const BLOCK_SIZE: usize = 2048;

/// RMS level (of full scale) below which a block is treated as silence.
const SILENCE_RMS: f32 = 0.01;

/// Amplitude used to trim leading/trailing near-zero runs before analysis.
const EDGE_TRIM_THRESHOLD: f32 = 0.2;

/// Estimates below this are rejected as degenerate rather than reported.
const MIN_AUDIBLE_HZ: f32 = 20.0;

/// One captured block of audio: a fixed-length run of amplitude samples plus
/// the rate they were captured at. Owned by the detector invocation that
/// consumes it.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleBlock {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }
}

/// Whether an estimate carries a detected pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    None,
    Voiced,
}

/// The result of analysing one [`SampleBlock`]. `frequency_hz` is `None`
/// when no periodicity was detectable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub frequency_hz: Option<f32>,
    pub confidence: Confidence,
}

impl PitchEstimate {
    pub fn voiced(frequency_hz: f32) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
            confidence: Confidence::Voiced,
        }
    }

    pub fn unvoiced() -> Self {
        Self {
            frequency_hz: None,
            confidence: Confidence::None,
        }
    }

    pub fn is_voiced(&self) -> bool {
        self.confidence == Confidence::Voiced
    }
}

/// Runs the autocorrelation estimator on one block.
pub fn detect_pitch(block: &SampleBlock) -> PitchEstimate {
    match autocorrelate(&block.samples, block.sample_rate) {
        Some(frequency) => PitchEstimate::voiced(frequency),
        None => PitchEstimate::unvoiced(),
    }
}

/// The estimator itself: RMS gate, edge trim, autocorrelation over all lags,
/// first-local-minimum skip, peak pick, parabolic refinement.
fn autocorrelate(signal: &[f32], sample_rate: u32) -> Option<f32> {
    if signal.len() < 4 {
        return None;
    }

    // Silence gate on the untrimmed block.
    let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt();
    if rms < SILENCE_RMS {
        return None;
    }

    // Trim leading/trailing near-zero runs to reduce edge artifacts. If no
    // sample clears the threshold the whole block is analysed as-is.
    let first = signal.iter().position(|s| s.abs() > EDGE_TRIM_THRESHOLD);
    let last = signal.iter().rposition(|s| s.abs() > EDGE_TRIM_THRESHOLD);
    let buf = match (first, last) {
        (Some(first), Some(last)) if last > first + 2 => &signal[first..=last],
        _ => signal,
    };
    let size = buf.len();

    // Unnormalized autocorrelation: c[lag] = sum over j of buf[j] * buf[j+lag].
    let mut c = vec![0.0f32; size];
    for (lag, value) in c.iter_mut().enumerate() {
        let mut sum = 0.0;
        for j in 0..size - lag {
            sum += buf[j] * buf[j + lag];
        }
        *value = sum;
    }

    // Walk down the slope from the zero-lag peak to the first local minimum.
    let mut d = 0;
    while d + 1 < size && c[d] > c[d + 1] {
        d += 1;
    }
    if d + 1 >= size {
        return None;
    }

    // Best integer period from the first minimum onward.
    let mut max_val = f32::NEG_INFINITY;
    let mut t0 = 0usize;
    for (lag, &value) in c.iter().enumerate().skip(d) {
        if value > max_val {
            max_val = value;
            t0 = lag;
        }
    }
    if t0 == 0 {
        return None;
    }

    // Parabolic interpolation through the peak's neighbors gives sub-sample
    // period precision. Skipped when a neighbor is out of bounds or the
    // vertex is flat.
    let t0_refined = if t0 + 1 < size {
        let x1 = c[t0 - 1];
        let x2 = c[t0];
        let x3 = c[t0 + 1];
        let denom = 2.0 * (2.0 * x2 - x1 - x3);
        if denom.abs() > f32::EPSILON {
            t0 as f32 + (x3 - x1) / denom
        } else {
            t0 as f32
        }
    } else {
        t0 as f32
    };

    if t0_refined <= 0.0 {
        return None;
    }
    let frequency = sample_rate as f32 / t0_refined;
    if frequency.is_finite() && frequency > MIN_AUDIBLE_HZ {
        Some(frequency)
    } else {
        None
    }
}
