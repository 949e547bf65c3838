//! Breathing-band filtering
//!
//! Two small stateful filters sit at the front of the pipeline:
//!
//! - [`BandpassFilter`]: direct-form-I IIR biquad modeling a 2nd-order
//!   Butterworth bandpass over the breathing band (0.1-0.5 Hz, i.e. 6-30
//!   breaths per minute) at the nominal 50 Hz sample rate. Removes baseline
//!   drift below the band and motion artefacts above it.
//! - [`GravityTracker`]: single-pole low-pass estimate of the gravity
//!   magnitude, whose residual is the chest-motion channel.

/// Direct-form-I biquad with fixed breathing-band coefficients.
///
/// Coefficients are pre-calculated for 0.1-0.5 Hz at 50 Hz input and are not
/// reconfigurable at runtime.
#[derive(Debug, Clone, Default)]
pub struct BandpassFilter {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BandpassFilter {
    const B0: f32 = 0.0201;
    const B1: f32 = 0.0;
    const B2: f32 = -0.0201;
    const A1: f32 = -1.5610;
    const A2: f32 = 0.6414;

    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the filter by one input sample and return the filtered value.
    pub fn process(&mut self, input: f32) -> f32 {
        let output = Self::B0 * input + Self::B1 * self.x1 + Self::B2 * self.x2
            - Self::A1 * self.y1
            - Self::A2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Zero the two-sample input and output history.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Single-pole IIR gravity estimator.
///
/// `g <- 0.8 * g + 0.2 * |a|`, initialized to standard gravity so the first
/// samples of a session do not see a large DC step.
#[derive(Debug, Clone)]
pub struct GravityTracker {
    estimate: f32,
}

impl GravityTracker {
    const SMOOTHING: f32 = 0.8;
    const STANDARD_GRAVITY: f32 = 9.81;

    pub fn new() -> Self {
        Self {
            estimate: Self::STANDARD_GRAVITY,
        }
    }

    /// Update the gravity estimate with a new accelerometer magnitude and
    /// return the gravity-removed residual.
    pub fn apply(&mut self, magnitude: f32) -> f32 {
        self.estimate = Self::SMOOTHING * self.estimate + (1.0 - Self::SMOOTHING) * magnitude;
        magnitude - self.estimate
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    /// Restore the initial standard-gravity estimate.
    pub fn reset(&mut self) {
        self.estimate = Self::STANDARD_GRAVITY;
    }
}

impl Default for GravityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_bandpass_zero_input_zero_output() {
        let mut filter = BandpassFilter::new();
        for _ in 0..100 {
            assert_eq!(filter.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_bandpass_attenuates_dc() {
        let mut filter = BandpassFilter::new();
        let mut last = 0.0;
        for _ in 0..500 {
            last = filter.process(1.0);
        }
        // DC sits far below the passband; steady-state output decays toward 0
        assert!(last.abs() < 0.05, "DC leak too large: {last}");
    }

    #[test]
    fn test_bandpass_passes_breathing_band() {
        let mut filter = BandpassFilter::new();
        let mut peak = 0.0f32;
        // 0.25 Hz sinusoid at 50 Hz, mid-passband
        for i in 0..1500 {
            let t = i as f32 / 50.0;
            let y = filter.process((2.0 * PI * 0.25 * t).sin());
            if i > 500 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.2, "passband gain too low: {peak}");
    }

    #[test]
    fn test_bandpass_reset_clears_state() {
        let mut filter = BandpassFilter::new();
        for i in 0..20 {
            filter.process(i as f32);
        }
        filter.reset();
        assert_eq!(filter.process(0.0), 0.0);
    }

    #[test]
    fn test_bandpass_output_stays_finite() {
        let mut filter = BandpassFilter::new();
        for i in 0..10_000 {
            let y = filter.process(((i as f32) * 0.7).sin() * 100.0);
            assert!(y.is_finite());
        }
    }

    #[test]
    fn test_gravity_converges_to_constant_input() {
        let mut tracker = GravityTracker::new();
        let mut residual = 0.0;
        for _ in 0..100 {
            residual = tracker.apply(9.5);
        }
        assert!((tracker.estimate() - 9.5).abs() < 1e-3);
        assert!(residual.abs() < 1e-3);
    }

    #[test]
    fn test_gravity_exact_at_standard_gravity() {
        let mut tracker = GravityTracker::new();
        // feeding the initial estimate leaves it unchanged
        let residual = tracker.apply(9.81);
        assert!(residual.abs() < 1e-5);
        assert!((tracker.estimate() - 9.81).abs() < 1e-5);
    }

    #[test]
    fn test_gravity_reset() {
        let mut tracker = GravityTracker::new();
        tracker.apply(20.0);
        tracker.reset();
        assert_eq!(tracker.estimate(), 9.81);
    }
}
