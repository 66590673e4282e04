//! # Trace Engine Module
//!
//! The single owned aggregate of all mutable core state: configuration,
//! theory engine and observation buffer. The host's tick driver is the only
//! mutator; every operation is synchronous and non-blocking, so a
//! single-threaded host needs no locking at all.
//!
//! Per tick the engine consumes at most one sample block, updates the trace,
//! and can then hand the renderer a complete [`RenderFrame`]: grid rows with
//! styling and labels, positioned observation points, and the proximity
//! links between them. The engine never draws anything itself.

use anyhow::Result;

use crate::config::{PlotConfig, RangeAdjustment};
use crate::freq;
use crate::layout::{self, ColumnSide};
use crate::pitch::{self, PitchEstimate, SampleBlock};
use crate::theory::{self, LineStyle, Rgb, TheoryEngine, Tonic};
use crate::trace::{self, TraceBuffer};

/// One horizontal reference row of the staff grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRow {
    pub y: f32,
    pub style: LineStyle,
    pub label: Option<&'static str>,
    /// Label background; `None` for out-of-scale notes, which render plain.
    pub background: Option<Rgb>,
    pub column: ColumnSide,
    /// In-scale rows render with the larger label font.
    pub diatonic: bool,
}

/// One live observation, positioned and colored for painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    pub opacity: f32,
}

/// Everything the rendering collaborator needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderFrame {
    pub rows: Vec<GridRow>,
    pub points: Vec<PlotPoint>,
    /// Index pairs into `points`, earlier observation first.
    pub links: Vec<(usize, usize)>,
}

/// The core engine aggregate.
pub struct TraceEngine {
    config: PlotConfig,
    pub theory: TheoryEngine,
    buffer: TraceBuffer,
}

impl TraceEngine {
    /// Builds an engine from a validated configuration.
    pub fn new(config: PlotConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            theory: TheoryEngine::new(),
            buffer: TraceBuffer::new(),
        })
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Replaces the configuration. On validation failure the previous
    /// configuration stays in effect.
    pub fn set_config(&mut self, config: PlotConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Steps one edge of the displayed range by a semitone. Steps that would
    /// leave the MIDI 24..=84 window or empty the range are ignored; returns
    /// whether the range changed.
    pub fn adjust_range(&mut self, adjustment: RangeAdjustment) -> bool {
        match self.config.adjusted(adjustment) {
            Some(next) => self.set_config(next).is_ok(),
            None => false,
        }
    }

    pub fn set_tonic(&mut self, tonic: Tonic) {
        self.theory.set_tonic(tonic);
    }

    /// Discards all buffered observations; tonic and toggles are kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn observation_count(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds one captured block through the detector. A voiced estimate
    /// inside the displayed frequency range becomes an observation, stored
    /// at its raw frequency; estimates outside the range are reported but
    /// never plotted, so no point lands on a grid line it did not hit.
    /// Stale observations are evicted either way.
    pub fn process_block(&mut self, block: &SampleBlock, now_ms: i64) -> PitchEstimate {
        let estimate = pitch::detect_pitch(block);
        if let Some(frequency) = estimate.frequency_hz {
            if frequency >= self.config.min_freq && frequency <= self.config.max_freq {
                self.buffer.append(frequency, now_ms);
            }
        }
        self.buffer
            .evict_older_than(now_ms, self.config.time_window_ms);
        estimate
    }

    /// Per-frame upkeep when no new block arrived: eviction only, so the
    /// trace drains during silence.
    pub fn tick(&mut self, now_ms: i64) {
        self.buffer
            .evict_older_than(now_ms, self.config.time_window_ms);
    }

    /// Computes the full set of render primitives for a plot area of
    /// `width` x `height` pixels at time `now_ms`. The right edge is "now";
    /// observations march left as they age.
    pub fn render_frame(&self, now_ms: i64, width: f32, height: f32) -> RenderFrame {
        let log_min = self.config.min_freq.ln();
        let log_max = self.config.max_freq.ln();
        let columns = layout::column_assignment(self.theory.tonic().pitch_class());

        let rows = layout::generate_grid(self.config.min_freq, self.config.max_freq)
            .into_iter()
            .map(|note| {
                let offset = self.theory.offset_pitch_class(note.midi);
                let pc = note.midi.rem_euclid(12) as u8;
                let diatonic = self.theory.is_diatonic(pc);
                GridRow {
                    y: layout::log_position(note.freq, log_min, log_max, height),
                    style: theory::line_style(offset),
                    label: self.theory.label(note.midi),
                    background: diatonic.then(|| theory::color(offset)),
                    column: columns.side_of(pc),
                    diatonic,
                }
            })
            .collect();

        let window = self.config.time_window_ms as f32;
        let points: Vec<PlotPoint> = self
            .buffer
            .iter()
            .map(|obs| {
                let age = (now_ms - obs.timestamp_ms) as f32;
                let midi = freq::midi_from_frequency(obs.frequency_hz);
                let cents = freq::cents_offset(obs.frequency_hz, midi);
                let fractional_midi = midi as f32 + cents as f32 / 100.0;
                PlotPoint {
                    x: width - age / window * width,
                    y: layout::log_position(obs.frequency_hz, log_min, log_max, height),
                    color: self.theory.color_for_pitch(fractional_midi),
                    opacity: (obs.clarity * 0.5).min(1.0),
                }
            })
            .collect();

        let positions: Vec<(f32, f32)> = points.iter().map(|p| (p.x, p.y)).collect();
        let links = trace::proximity_links(
            &positions,
            self.config.proximity_threshold_px,
            self.config.max_links_per_point,
        );

        RenderFrame {
            rows,
            points,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::BLOCK_SIZE;

    fn sine_block(frequency: f32) -> SampleBlock {
        let samples = (0..BLOCK_SIZE)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / 44100.0).sin())
            .collect();
        SampleBlock::new(samples, 44100)
    }

    fn engine() -> TraceEngine {
        TraceEngine::new(PlotConfig::default()).unwrap()
    }

    #[test]
    fn voiced_block_becomes_an_observation() {
        let mut engine = engine();
        let estimate = engine.process_block(&sine_block(220.0), 0);
        assert!(estimate.is_voiced());
        assert_eq!(engine.observation_count(), 1);
    }

    #[test]
    fn silent_block_adds_nothing() {
        let mut engine = engine();
        let silent = SampleBlock::new(vec![0.0; BLOCK_SIZE], 44100);
        let estimate = engine.process_block(&silent, 0);
        assert!(!estimate.is_voiced());
        assert_eq!(engine.observation_count(), 0);
    }

    #[test]
    fn subsonic_estimates_stay_off_the_plot() {
        // 50 Hz is a valid detection but sits below the 87 Hz display floor.
        let mut engine = engine();
        let estimate = engine.process_block(&sine_block(50.0), 0);
        assert!(estimate.is_voiced());
        assert_eq!(engine.observation_count(), 0);
    }

    #[test]
    fn above_ceiling_estimates_stay_off_the_plot() {
        // 880 Hz is detected fine but sits above the 700 Hz display ceiling;
        // storing it would pin a false observation to the top grid line.
        let mut engine = engine();
        let estimate = engine.process_block(&sine_block(880.0), 0);
        assert!(estimate.is_voiced());
        assert_eq!(engine.observation_count(), 0);
    }

    #[test]
    fn tick_drains_stale_observations() {
        let mut engine = engine();
        engine.process_block(&sine_block(220.0), 0);
        engine.tick(9000);
        assert_eq!(engine.observation_count(), 0);
    }

    #[test]
    fn range_adjustment_reaches_new_grid_notes() {
        let mut engine = engine();
        // 720 Hz starts above the default ~700 Hz ceiling.
        engine.process_block(&sine_block(720.0), 0);
        assert_eq!(engine.observation_count(), 0);

        // One semitone up moves the ceiling to F♯5 (~740 Hz).
        assert!(engine.adjust_range(RangeAdjustment::ExpandUpper));
        engine.process_block(&sine_block(720.0), 100);
        assert_eq!(engine.observation_count(), 1);

        // The grid follows the widened range.
        let frame = engine.render_frame(100, 950.0, 500.0);
        assert_eq!(frame.rows.last().map(|row| row.y), Some(0.0));
        assert_eq!(frame.rows.len(), 38); // MIDI 41..=78
    }

    #[test]
    fn refused_range_adjustment_leaves_config_alone() {
        let mut engine = engine();
        for _ in 0..60 {
            engine.adjust_range(RangeAdjustment::ExpandUpper);
        }
        let ceiling = engine.config().max_freq;
        assert!(!engine.adjust_range(RangeAdjustment::ExpandUpper));
        assert_eq!(engine.config().max_freq, ceiling);
    }

    #[test]
    fn invalid_config_keeps_prior_state() {
        let mut engine = engine();
        let bad = PlotConfig {
            min_freq: 900.0,
            max_freq: 100.0,
            ..Default::default()
        };
        assert!(engine.set_config(bad).is_err());
        assert_eq!(*engine.config(), PlotConfig::default());
    }

    #[test]
    fn render_frame_positions_are_consistent() {
        let mut engine = engine();
        engine.process_block(&sine_block(220.0), 0);
        engine.process_block(&sine_block(220.0), 1000);
        let frame = engine.render_frame(1000, 950.0, 500.0);

        assert_eq!(frame.points.len(), 2);
        // The newest observation sits at the right edge; the older one left of it.
        assert!((frame.points[1].x - 950.0).abs() < 1e-3);
        assert!(frame.points[0].x < frame.points[1].x);
        // Same pitch, same height.
        assert!((frame.points[0].y - frame.points[1].y).abs() < 1e-3);
        assert_eq!(frame.points[0].opacity, 0.5);

        // Grid rows descend in y as MIDI ascends.
        for pair in frame.rows.windows(2) {
            assert!(pair[0].y > pair[1].y);
        }
    }

    #[test]
    fn render_frame_marks_tonic_row() {
        let mut engine = engine();
        engine.set_tonic(Tonic::A);
        let frame = engine.render_frame(0, 950.0, 500.0);

        // A3 (220 Hz) is on the grid; its row carries the tonic accent line.
        let accent_rows: Vec<&GridRow> = frame
            .rows
            .iter()
            .filter(|row| {
                matches!(row.style, LineStyle::Line { width, .. } if width == 2.0)
            })
            .collect();
        assert!(!accent_rows.is_empty());
        for row in accent_rows {
            assert_eq!(row.background, Some(theory::color(0)));
            assert!(row.diatonic);
        }
    }
}
