//! Tap tempo
//!
//! Lets the user declare a tempo by tapping along. This is input averaging,
//! not audio analysis: the result is whatever the taps say.

use std::collections::VecDeque;

/// Taps kept for averaging
const DEFAULT_WINDOW: usize = 8;
/// A pause longer than this starts a new tap sequence
const DEFAULT_RESET_GAP_MS: u64 = 2_000;

/// Tap-based tempo estimator
///
/// ```
/// use eightcount::session::TapTempo;
///
/// let mut tapper = TapTempo::default();
/// tapper.tap(1_000);
/// assert_eq!(tapper.tap(1_500), Some(120.0));
/// ```
#[derive(Debug, Clone)]
pub struct TapTempo {
    window: usize,
    reset_gap_ms: u64,
    taps: VecDeque<u64>,
}

impl TapTempo {
    /// * `window` – most recent taps used for the average (at least 2)
    /// * `reset_gap_ms` – gap after which the tap history is cleared
    pub fn new(window: usize, reset_gap_ms: u64) -> Self {
        let window = window.max(2);
        Self {
            window,
            reset_gap_ms,
            taps: VecDeque::with_capacity(window),
        }
    }

    /// Estimator over a complete, recorded tap sequence
    ///
    /// Every tap is averaged. Returns `None` unless there are at least two
    /// taps and each one is later than the one before.
    pub fn from_taps(taps: &[u64]) -> Option<Self> {
        if taps.len() < 2 || !taps.windows(2).all(|w| w[0] < w[1]) {
            return None;
        }

        let mut tapper = Self::new(taps.len(), u64::MAX);
        for &t in taps {
            tapper.tap(t);
        }
        Some(tapper)
    }

    /// Register a tap at `timestamp_ms`
    ///
    /// Returns the BPM over the current window once two taps are in it.
    /// Timestamps that go backwards restart the sequence.
    pub fn tap(&mut self, timestamp_ms: u64) -> Option<f64> {
        if let Some(&last) = self.taps.back() {
            if timestamp_ms <= last || timestamp_ms - last > self.reset_gap_ms {
                self.taps.clear();
            }
        }

        self.taps.push_back(timestamp_ms);
        while self.taps.len() > self.window {
            self.taps.pop_front();
        }

        self.bpm()
    }

    /// Current estimate without adding a tap
    pub fn bpm(&self) -> Option<f64> {
        let (first, last) = (*self.taps.front()?, *self.taps.back()?);
        if self.taps.len() < 2 || last <= first {
            return None;
        }
        let avg_interval = (last - first) as f64 / (self.taps.len() - 1) as f64;
        Some(60_000.0 / avg_interval)
    }

    /// First tap of the current sequence, a natural first-beat position
    pub fn first_tap_ms(&self) -> Option<u64> {
        self.taps.front().copied()
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_RESET_GAP_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_taps_uses_whole_sequence() {
        let tapper = TapTempo::from_taps(&[1_000, 1_500, 2_000, 2_500]).unwrap();
        assert_eq!(tapper.bpm(), Some(120.0));
        assert_eq!(tapper.first_tap_ms(), Some(1_000));
        assert_eq!(tapper.tap_count(), 4);
    }

    #[test]
    fn test_from_taps_rejects_out_of_order_sequence() {
        // Would otherwise restart at 1200 and report 120 BPM from the last two taps
        assert!(TapTempo::from_taps(&[1_000, 1_500, 1_200, 1_700]).is_none());
        assert!(TapTempo::from_taps(&[1_000, 1_000]).is_none());
        assert!(TapTempo::from_taps(&[1_000]).is_none());
    }

    #[test]
    fn test_single_tap_has_no_tempo() {
        let mut tapper = TapTempo::default();
        assert_eq!(tapper.tap(1_000), None);
        assert_eq!(tapper.first_tap_ms(), Some(1_000));
    }

    #[test]
    fn test_steady_taps() {
        let mut tapper = TapTempo::default();
        let mut last = None;
        for i in 0..6 {
            last = tapper.tap(500 + i * 480);
        }
        assert_eq!(last, Some(125.0));
    }

    #[test]
    fn test_window_slides() {
        let mut tapper = TapTempo::new(3, 5_000);
        tapper.tap(0);
        tapper.tap(1_000);
        tapper.tap(2_000);
        // Window now holds 1000, 2000, 2500
        assert_eq!(tapper.tap(2_500), Some(80.0));
        assert_eq!(tapper.tap_count(), 3);
    }

    #[test]
    fn test_long_gap_restarts() {
        let mut tapper = TapTempo::default();
        tapper.tap(0);
        tapper.tap(500);
        assert_eq!(tapper.tap(10_000), None);
        assert_eq!(tapper.first_tap_ms(), Some(10_000));
        assert_eq!(tapper.tap(10_600), Some(100.0));
    }

    #[test]
    fn test_backwards_timestamp_restarts() {
        let mut tapper = TapTempo::default();
        tapper.tap(5_000);
        tapper.tap(5_500);
        assert_eq!(tapper.tap(1_000), None);
        assert_eq!(tapper.tap_count(), 1);
    }

    #[test]
    fn test_window_minimum() {
        let mut tapper = TapTempo::new(0, 1_000);
        tapper.tap(0);
        assert_eq!(tapper.tap(600), Some(100.0));
        tapper.reset();
        assert_eq!(tapper.bpm(), None);
    }
}
