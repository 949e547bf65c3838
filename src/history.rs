//! Breath-cycle history and derived respiratory metrics
//!
//! A sliding 60-second window of detected breath cycles, ordered by
//! timestamp, from which the aggregate metrics are derived lazily:
//! breathing rate (over the most recent 30 s), regularity (coefficient of
//! variation of cycle durations), and an SNR estimate over cycle amplitudes.

use std::collections::VecDeque;

use crate::types::BreathCycle;

/// History window length in milliseconds.
pub const HISTORY_WINDOW_MS: u64 = 60_000;

/// Breathing rate is averaged over this most-recent span.
const RATE_WINDOW_MS: u64 = 30_000;

const MIN_CYCLES_FOR_RATE: usize = 3;
const MIN_CYCLES_FOR_REGULARITY: usize = 5;
const MIN_CYCLES_FOR_SNR: usize = 3;

const EPSILON: f32 = 1e-6;

/// Sliding window of breath cycles.
#[derive(Debug, Clone, Default)]
pub struct BreathHistory {
    cycles: VecDeque<BreathCycle>,
}

impl BreathHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cycle and evict entries older than the 60-s window.
    ///
    /// Cycles arrive with non-decreasing timestamps (the detector only
    /// emits on forward time), which keeps the deque ordered.
    pub fn push(&mut self, cycle: BreathCycle) {
        self.cycles.push_back(cycle);
        while let Some(front) = self.cycles.front() {
            if cycle.timestamp_ms.saturating_sub(front.timestamp_ms) > HISTORY_WINDOW_MS {
                self.cycles.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Cycles currently in the window, oldest first.
    pub fn cycles(&self) -> &VecDeque<BreathCycle> {
        &self.cycles
    }

    pub fn clear(&mut self) {
        self.cycles.clear();
    }

    /// Breaths per minute over the last 30 s of cycles; 0 with fewer than
    /// three cycles in the window.
    pub fn breathing_rate_bpm(&self) -> f32 {
        if self.cycles.len() < MIN_CYCLES_FOR_RATE {
            return 0.0;
        }

        // Newest-first; the deque ordering makes the first out-of-window
        // entry a valid stopping point.
        let now = match self.cycles.back() {
            Some(cycle) => cycle.timestamp_ms,
            None => return 0.0,
        };

        let mut sum = 0.0f32;
        let mut count = 0usize;
        for cycle in self.cycles.iter().rev() {
            if cycle.timestamp_ms > now || now - cycle.timestamp_ms > RATE_WINDOW_MS {
                break;
            }
            sum += cycle.duration_ms;
            count += 1;
        }

        if count == 0 {
            return 0.0;
        }
        let avg_duration = sum / count as f32;
        if avg_duration < EPSILON {
            return 0.0;
        }
        60_000.0 / avg_duration
    }

    /// Breathing regularity in [0, 1]: one minus the coefficient of
    /// variation of cycle durations; 0 with fewer than five cycles.
    pub fn regularity(&self) -> f32 {
        if self.cycles.len() < MIN_CYCLES_FOR_REGULARITY {
            return 0.0;
        }

        let n = self.cycles.len() as f32;
        let mean = self.cycles.iter().map(|c| c.duration_ms).sum::<f32>() / n;
        if mean < EPSILON {
            return 0.0;
        }
        let variance = self
            .cycles
            .iter()
            .map(|c| {
                let diff = c.duration_ms - mean;
                diff * diff
            })
            .sum::<f32>()
            / n;

        let cv = variance.sqrt() / mean;
        (1.0 - cv).clamp(0.0, 1.0)
    }

    /// Amplitude signal-to-noise estimate: mean over standard deviation of
    /// cycle amplitudes; 0 with fewer than three cycles or degenerate noise.
    pub fn snr(&self) -> f32 {
        if self.cycles.len() < MIN_CYCLES_FOR_SNR {
            return 0.0;
        }

        let n = self.cycles.len() as f32;
        let mean = self.cycles.iter().map(|c| c.amplitude).sum::<f32>() / n;
        let variance = self
            .cycles
            .iter()
            .map(|c| {
                let diff = c.amplitude - mean;
                diff * diff
            })
            .sum::<f32>()
            / n;

        let noise = variance.sqrt();
        if noise < EPSILON {
            return 0.0;
        }
        mean / noise
    }
}
