//! # Pitch Trace Module
//!
//! Time-windowed storage of pitch observations. Observations are appended at
//! the tail in time order and evicted from the head once they age past the
//! configured window, so the visible trace scrolls off the plot on its own
//! even when no new pitch arrives.

use std::collections::VecDeque;

/// A single confident pitch reading, timestamped at capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteObservation {
    pub frequency_hz: f32,
    pub timestamp_ms: i64,
    /// Confidence weight in [0, 1], used for rendering opacity.
    pub clarity: f32,
}

/// Append-only, time-ordered buffer of observations.
///
/// Invariant: after eviction, every entry satisfies
/// `now - timestamp_ms <= window_ms`.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    observations: VecDeque<NoteObservation>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a confident observation at the tail. Clarity is fixed at 1.0;
    /// the detector only reports voiced estimates it is sure of.
    pub fn append(&mut self, frequency_hz: f32, now_ms: i64) {
        self.observations.push_back(NoteObservation {
            frequency_hz,
            timestamp_ms: now_ms,
            clarity: 1.0,
        });
    }

    /// Drops head entries older than the window. Called after every append
    /// and again on every tick so the buffer drains during silence.
    pub fn evict_older_than(&mut self, now_ms: i64, window_ms: i64) {
        while let Some(head) = self.observations.front() {
            if now_ms - head.timestamp_ms > window_ms {
                self.observations.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteObservation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn clear(&mut self) {
        self.observations.clear();
    }
}

/// Links nearby plotted observations for rendering.
///
/// For each point `i`, later points `j > i` within `threshold_px` are linked
/// until `max_per_point` links have been made for `i`. The cap bounds the
/// work per frame regardless of buffer size (O(n·k) rather than full O(n²)),
/// and the result depends only on the positions given, not on draw order.
pub fn proximity_links(
    positions: &[(f32, f32)],
    threshold_px: f32,
    max_per_point: usize,
) -> Vec<(usize, usize)> {
    let mut links = Vec::new();
    for i in 0..positions.len() {
        let mut made = 0;
        for j in (i + 1)..positions.len() {
            if made >= max_per_point {
                break;
            }
            let dx = positions[i].0 - positions[j].0;
            let dy = positions[i].1 - positions[j].1;
            if (dx * dx + dy * dy).sqrt() <= threshold_px {
                links.push((i, j));
                made += 1;
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_respects_window_boundary() {
        let mut buffer = TraceBuffer::new();
        for t in (0..=9000).step_by(1000) {
            buffer.append(220.0, t);
        }
        buffer.evict_older_than(9000, 8000);

        // t=0 is 9000 ms old (> window); t=1000 is exactly 8000 ms old and stays.
        assert_eq!(buffer.len(), 9);
        assert!(buffer.iter().all(|obs| obs.timestamp_ms >= 1000));
    }

    #[test]
    fn eviction_drains_without_appends() {
        let mut buffer = TraceBuffer::new();
        buffer.append(330.0, 0);
        buffer.append(330.0, 100);
        buffer.evict_older_than(10_000, 8000);
        assert!(buffer.is_empty());
    }

    #[test]
    fn append_sets_full_clarity() {
        let mut buffer = TraceBuffer::new();
        buffer.append(261.6, 42);
        let obs = buffer.iter().next().unwrap();
        assert_eq!(obs.clarity, 1.0);
        assert_eq!(obs.timestamp_ms, 42);
    }

    #[test]
    fn links_have_no_self_pairs_and_respect_cap() {
        // Ten coincident points: everything is within range of everything.
        let positions = vec![(0.0f32, 0.0f32); 10];
        let links = proximity_links(&positions, 30.0, 5);

        for &(i, j) in &links {
            assert!(j > i, "link ({}, {}) is not forward-ordered", i, j);
        }
        for i in 0..positions.len() {
            let outgoing = links.iter().filter(|&&(a, _)| a == i).count();
            assert!(outgoing <= 5, "point {} has {} links", i, outgoing);
        }
    }

    #[test]
    fn links_only_join_nearby_points() {
        let positions = vec![(0.0, 0.0), (10.0, 0.0), (100.0, 0.0)];
        let links = proximity_links(&positions, 30.0, 5);
        assert_eq!(links, vec![(0, 1)]);
    }

    #[test]
    fn links_are_deterministic() {
        let positions: Vec<(f32, f32)> = (0..50).map(|i| (i as f32 * 7.0, 0.0)).collect();
        let a = proximity_links(&positions, 30.0, 5);
        let b = proximity_links(&positions, 30.0, 5);
        assert_eq!(a, b);
    }
}
