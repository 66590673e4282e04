//! # Layout Mapper Module
//!
//! Pure mappings from pitch to plot geometry: the reference note grid, the
//! log-frequency vertical scale, and the two-column label split. No mutable
//! state lives here.

use crate::freq;

/// MIDI range scanned when generating the reference grid.
pub const GRID_MIDI_LOW: i32 = 12;
pub const GRID_MIDI_HIGH: i32 = 108;

/// One reference note whose frequency falls inside the displayed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridNote {
    pub midi: i32,
    pub freq: f32,
}

/// Every integer MIDI note whose frequency lies in `[min_freq, max_freq]`,
/// in ascending order.
pub fn generate_grid(min_freq: f32, max_freq: f32) -> Vec<GridNote> {
    (GRID_MIDI_LOW..=GRID_MIDI_HIGH)
        .filter_map(|midi| {
            let freq = freq::frequency_from_midi(midi as f32);
            (freq >= min_freq && freq <= max_freq).then_some(GridNote { midi, freq })
        })
        .collect()
}

/// Vertical position of a frequency on a log scale: higher pitch, smaller y.
///
/// The same mapping positions both the reference grid and live observations
/// so the two stay aligned.
pub fn log_position(freq: f32, log_min: f32, log_max: f32, height: f32) -> f32 {
    let normalized = (freq.ln() - log_min) / (log_max - log_min);
    height - normalized * height
}

/// Which of the two label columns a note is drawn in. The inside column sits
/// nearer the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSide {
    Inside,
    Outside,
}

const COLUMN_EVEN: [u8; 6] = [0, 2, 4, 6, 8, 10];
const COLUMN_ODD: [u8; 6] = [1, 3, 5, 7, 9, 11];

/// The 6/6 pitch-class split between the two label columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSplit {
    pub inside: [u8; 6],
    pub outside: [u8; 6],
}

impl ColumnSplit {
    pub fn side_of(&self, pc: u8) -> ColumnSide {
        if self.inside.contains(&pc) {
            ColumnSide::Inside
        } else {
            ColumnSide::Outside
        }
    }
}

/// Partitions the 12 pitch classes into the two fixed alternating 6-sets,
/// relabelling whichever set holds the tonic as "inside" so the tonic stays
/// visually anchored to the same side in every key.
pub fn column_assignment(tonic_pc: u8) -> ColumnSplit {
    if COLUMN_ODD.contains(&tonic_pc) {
        ColumnSplit {
            inside: COLUMN_ODD,
            outside: COLUMN_EVEN,
        }
    } else {
        ColumnSplit {
            inside: COLUMN_EVEN,
            outside: COLUMN_ODD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_configured_range() {
        let grid = generate_grid(87.0, 700.0);
        assert!(!grid.is_empty());
        assert!(grid.iter().all(|n| n.freq >= 87.0 && n.freq <= 700.0));
        // Ascending in both MIDI and frequency.
        for pair in grid.windows(2) {
            assert!(pair[0].midi < pair[1].midi);
            assert!(pair[0].freq < pair[1].freq);
        }
        // F2 (MIDI 41, ~87.31 Hz) through F5 (MIDI 77, ~698.46 Hz).
        assert_eq!(grid.first().map(|n| n.midi), Some(41));
        assert_eq!(grid.last().map(|n| n.midi), Some(77));
    }

    #[test]
    fn log_position_is_monotonic_decreasing() {
        let (log_min, log_max) = (87.0f32.ln(), 700.0f32.ln());
        let top = log_position(700.0, log_min, log_max, 500.0);
        let middle = log_position(220.0, log_min, log_max, 500.0);
        let bottom = log_position(87.0, log_min, log_max, 500.0);
        assert!(top < middle && middle < bottom);
        assert!((top - 0.0).abs() < 1e-3);
        assert!((bottom - 500.0).abs() < 1e-3);
    }

    #[test]
    fn columns_split_six_and_six_with_tonic_inside() {
        for tonic_pc in 0..12u8 {
            let split = column_assignment(tonic_pc);
            assert_eq!(split.inside.len(), 6);
            assert_eq!(split.outside.len(), 6);
            assert_eq!(split.side_of(tonic_pc), ColumnSide::Inside);

            // Together the two columns cover all 12 pitch classes.
            let mut all: Vec<u8> = split
                .inside
                .iter()
                .chain(split.outside.iter())
                .copied()
                .collect();
            all.sort_unstable();
            assert_eq!(all, (0..12).collect::<Vec<u8>>());
        }
    }
}
