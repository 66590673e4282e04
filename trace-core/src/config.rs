//! # Configuration Module
//!
//! The host-facing configuration surface for the plot and trace engine.
//! Invalid values are rejected at the boundary; the engine keeps its prior
//! valid configuration when validation fails.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::freq;

/// Absolute MIDI bounds the display range may not leave.
pub const RANGE_MIDI_LOW: i32 = 24;
pub const RANGE_MIDI_HIGH: i32 = 84;

/// A one-semitone step of one edge of the displayed frequency range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeAdjustment {
    /// Raise the top of the range.
    ExpandUpper,
    /// Lower the top of the range.
    ContractUpper,
    /// Lower the bottom of the range.
    ExpandLower,
    /// Raise the bottom of the range.
    ContractLower,
}

/// Plot and trace parameters, set by the host and read by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Lower edge of the displayed frequency range, Hz.
    pub min_freq: f32,
    /// Upper edge of the displayed frequency range, Hz.
    pub max_freq: f32,
    /// How long observations stay visible.
    pub time_window_ms: i64,
    /// Maximum screen distance for linking two observations.
    pub proximity_threshold_px: f32,
    /// Link cap per observation; bounds per-frame link work.
    pub max_links_per_point: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            min_freq: 87.0,
            max_freq: 700.0,
            time_window_ms: 8000,
            proximity_threshold_px: 30.0,
            max_links_per_point: 5,
        }
    }
}

impl PlotConfig {
    /// Checks every invariant the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.min_freq.is_finite() || !self.max_freq.is_finite() {
            bail!("frequency range must be finite");
        }
        if self.min_freq >= self.max_freq {
            bail!(
                "minimum frequency {:.1} Hz must be below maximum {:.1} Hz",
                self.min_freq,
                self.max_freq
            );
        }
        let floor = freq::frequency_from_midi(RANGE_MIDI_LOW as f32);
        let ceiling = freq::frequency_from_midi(RANGE_MIDI_HIGH as f32);
        if self.min_freq < floor || self.max_freq > ceiling {
            bail!(
                "frequency range {:.1}..{:.1} Hz exceeds the displayable {:.1}..{:.1} Hz",
                self.min_freq,
                self.max_freq,
                floor,
                ceiling
            );
        }
        if self.time_window_ms <= 0 {
            bail!("time window must be positive, got {} ms", self.time_window_ms);
        }
        if !(self.proximity_threshold_px > 0.0) {
            bail!("proximity threshold must be positive");
        }
        if self.max_links_per_point == 0 {
            bail!("link cap must be at least 1");
        }
        Ok(())
    }

    /// The configuration with one range edge stepped by a semitone, or
    /// `None` when the step would leave MIDI 24..=84 or close the range to
    /// less than one semitone. Edges snap to the equal-tempered grid.
    pub fn adjusted(&self, adjustment: RangeAdjustment) -> Option<PlotConfig> {
        let low = freq::midi_from_frequency(self.min_freq);
        let high = freq::midi_from_frequency(self.max_freq);
        let (low, high) = match adjustment {
            RangeAdjustment::ExpandUpper => (low, high + 1),
            RangeAdjustment::ContractUpper => (low, high - 1),
            RangeAdjustment::ExpandLower => (low - 1, high),
            RangeAdjustment::ContractLower => (low + 1, high),
        };
        if low < RANGE_MIDI_LOW || high > RANGE_MIDI_HIGH || low >= high {
            return None;
        }
        let next = PlotConfig {
            min_freq: freq::frequency_from_midi(low as f32),
            max_freq: freq::frequency_from_midi(high as f32),
            ..*self
        };
        next.validate().ok()?;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PlotConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = PlotConfig {
            min_freq: 700.0,
            max_freq: 87.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn range_outside_midi_bounds_is_rejected() {
        // MIDI 24 is ~32.7 Hz; 10 Hz is below the displayable floor.
        let too_low = PlotConfig {
            min_freq: 10.0,
            ..Default::default()
        };
        assert!(too_low.validate().is_err());

        // MIDI 84 is ~1046.5 Hz; 2000 Hz is above the ceiling.
        let too_high = PlotConfig {
            max_freq: 2000.0,
            ..Default::default()
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn range_adjustment_steps_by_semitone() {
        // Defaults sit at F2 (MIDI 41) .. F5 (MIDI 77).
        let config = PlotConfig::default();

        let wider = config.adjusted(RangeAdjustment::ExpandUpper).unwrap();
        assert!((wider.max_freq - freq::frequency_from_midi(78.0)).abs() < 1e-3);
        assert_eq!(wider.min_freq, config.min_freq);

        let lower = config.adjusted(RangeAdjustment::ExpandLower).unwrap();
        assert!((lower.min_freq - freq::frequency_from_midi(40.0)).abs() < 1e-3);

        let narrower = config.adjusted(RangeAdjustment::ContractUpper).unwrap();
        assert!((narrower.max_freq - freq::frequency_from_midi(76.0)).abs() < 1e-3);
    }

    #[test]
    fn range_adjustment_respects_limits() {
        // At the C1..C6 limits, expanding further is refused.
        let at_limits = PlotConfig {
            min_freq: freq::frequency_from_midi(RANGE_MIDI_LOW as f32),
            max_freq: freq::frequency_from_midi(RANGE_MIDI_HIGH as f32),
            ..Default::default()
        };
        assert!(at_limits.validate().is_ok());
        assert_eq!(at_limits.adjusted(RangeAdjustment::ExpandUpper), None);
        assert_eq!(at_limits.adjusted(RangeAdjustment::ExpandLower), None);

        // A one-semitone range cannot contract from either edge.
        let narrow = PlotConfig {
            min_freq: freq::frequency_from_midi(60.0),
            max_freq: freq::frequency_from_midi(61.0),
            ..Default::default()
        };
        assert_eq!(narrow.adjusted(RangeAdjustment::ContractUpper), None);
        assert_eq!(narrow.adjusted(RangeAdjustment::ContractLower), None);
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        let negative_window = PlotConfig {
            time_window_ms: -1,
            ..Default::default()
        };
        assert!(negative_window.validate().is_err());

        let zero_threshold = PlotConfig {
            proximity_threshold_px: 0.0,
            ..Default::default()
        };
        assert!(zero_threshold.validate().is_err());

        let zero_cap = PlotConfig {
            max_links_per_point: 0,
            ..Default::default()
        };
        assert!(zero_cap.validate().is_err());
    }
}
