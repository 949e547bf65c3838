//! Breath peak detection
//!
//! Adaptive-threshold hysteresis detector over the bandpass-filtered
//! breathing signal. The threshold tracks `mean + 0.6 * sigma` of a
//! 256-sample signal window; a rising crossing opens a peak, and the peak
//! closes only once the signal falls below 80% of the threshold, preventing
//! re-triggering on quantization chatter. Rising edges separated by a
//! physiologically plausible interval emit a [`BreathCycle`].

use crate::stats::RingStats;
use crate::types::BreathCycle;

/// Breathing-signal window backing the adaptive threshold.
pub const SIGNAL_WINDOW: usize = 256;

/// Threshold offset in standard deviations above the window mean.
const THRESHOLD_MULTIPLIER: f32 = 0.6;

/// Fraction of the threshold the signal must drop below to close a peak.
const RELEASE_FRACTION: f32 = 0.8;

/// Plausible breath-to-breath interval: 0.5-6 s (10-120 BPM).
const MIN_CYCLE_MS: u64 = 500;
const MAX_CYCLE_MS: u64 = 6000;

const EPSILON: f32 = 1e-6;
const MIN_STDDEV: f32 = 1e-6;

/// Hysteresis peak detector emitting breath cycles.
#[derive(Debug, Clone)]
pub struct BreathPeakDetector {
    window: RingStats,
    in_peak: bool,
    last_peak_time: u64,
    last_peak_value: f32,
    threshold: f32,
}

impl BreathPeakDetector {
    pub fn new() -> Self {
        Self {
            window: RingStats::new(SIGNAL_WINDOW),
            in_peak: false,
            last_peak_time: 0,
            last_peak_value: 0.0,
            threshold: 0.1,
        }
    }

    /// Advance the detector by one filtered sample.
    ///
    /// Returns a cycle when this sample opens a peak at a plausible distance
    /// from the previous one. Rising edges always record the new peak time,
    /// so a non-monotonic timestamp suppresses emission but still re-anchors
    /// the detector.
    pub fn step(&mut self, signal: f32, timestamp_ms: u64) -> Option<BreathCycle> {
        self.window.push(signal);

        let mean = self.window.mean();
        let stddev = self.window.std_dev().max(MIN_STDDEV);
        self.threshold = mean + stddev * THRESHOLD_MULTIPLIER;

        let mut cycle = None;

        if !self.in_peak && signal > self.threshold {
            self.in_peak = true;

            if self.last_peak_time > 0 && timestamp_ms >= self.last_peak_time {
                let duration = timestamp_ms - self.last_peak_time;
                if duration > MIN_CYCLE_MS && duration < MAX_CYCLE_MS {
                    cycle = Some(BreathCycle {
                        timestamp_ms,
                        duration_ms: duration as f32,
                        amplitude: signal / stddev,
                    });
                }
            }

            self.last_peak_time = timestamp_ms;
            self.last_peak_value = signal;
        } else if self.in_peak && signal < self.threshold * RELEASE_FRACTION - EPSILON {
            self.in_peak = false;
        }

        cycle
    }

    /// Current adaptive threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Time and value of the most recent rising edge.
    pub fn last_peak(&self) -> (u64, f32) {
        (self.last_peak_time, self.last_peak_value)
    }

    pub fn reset(&mut self) {
        self.window.reset();
        self.in_peak = false;
        self.last_peak_time = 0;
        self.last_peak_value = 0.0;
        self.threshold = 0.1;
    }
}

impl Default for BreathPeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the detector with a pulse at the given timestamp: a handful of
    /// elevated samples followed by a return to baseline.
    fn feed_pulse(detector: &mut BreathPeakDetector, t_ms: u64) -> Option<BreathCycle> {
        let mut emitted = None;
        for k in 0..5u64 {
            if let Some(c) = detector.step(1.0, t_ms + k) {
                emitted = Some(c);
            }
        }
        for k in 5..10u64 {
            detector.step(-0.5, t_ms + k);
        }
        emitted
    }

    #[test]
    fn test_quiet_signal_never_triggers() {
        let mut detector = BreathPeakDetector::new();
        for i in 0..1000 {
            assert!(detector.step(0.0, i * 20).is_none());
        }
    }

    #[test]
    fn test_first_peak_emits_nothing() {
        let mut detector = BreathPeakDetector::new();
        assert!(feed_pulse(&mut detector, 1000).is_none());
    }

    #[test]
    fn test_second_peak_in_window_emits_cycle() {
        let mut detector = BreathPeakDetector::new();
        feed_pulse(&mut detector, 1000);
        let cycle = feed_pulse(&mut detector, 5000);
        let cycle = cycle.expect("plausible interval should emit a cycle");
        assert_eq!(cycle.timestamp_ms, 5000);
        assert!((cycle.duration_ms - 4000.0).abs() < 1e-3);
        assert!(cycle.amplitude > 0.0);
    }

    #[test]
    fn test_interval_bounds_are_exclusive() {
        // 500 ms exactly is too fast
        let mut detector = BreathPeakDetector::new();
        feed_pulse(&mut detector, 1000);
        assert!(feed_pulse(&mut detector, 1500).is_none());

        // 6000 ms exactly is too slow
        let mut detector = BreathPeakDetector::new();
        feed_pulse(&mut detector, 1000);
        assert!(feed_pulse(&mut detector, 7000).is_none());
    }

    #[test]
    fn test_hysteresis_holds_during_sustained_peak() {
        let mut detector = BreathPeakDetector::new();
        feed_pulse(&mut detector, 1000);
        // stay above the release level for the whole plateau
        let mut emissions = 0;
        for k in 0..50u64 {
            if detector.step(1.0, 5000 + k).is_some() {
                emissions += 1;
            }
        }
        // one rising edge, however long the plateau
        assert!(emissions <= 1);
    }

    #[test]
    fn test_non_monotonic_timestamp_reanchors_without_emitting() {
        let mut detector = BreathPeakDetector::new();
        feed_pulse(&mut detector, 10_000);
        // clock jumped backwards: no cycle, but the peak time moves
        assert!(feed_pulse(&mut detector, 4000).is_none());
        let (anchor_ms, anchor_value) = detector.last_peak();
        assert_eq!(anchor_ms, 4000);
        assert!(anchor_value > 0.0);
        // next peak measures from the re-anchored time
        let cycle = feed_pulse(&mut detector, 8000).expect("cycle after re-anchor");
        assert!((cycle.duration_ms - 4000.0).abs() < 20.0);
    }

    #[test]
    fn test_reset_clears_peak_anchor() {
        let mut detector = BreathPeakDetector::new();
        feed_pulse(&mut detector, 1000);
        detector.reset();
        assert!((detector.threshold() - 0.1).abs() < 1e-6);
        // first peak after reset emits nothing again
        assert!(feed_pulse(&mut detector, 5000).is_none());
    }
}
