//! Phase-memory instability operator
//!
//! Computes a deterministic divergence measure over the bandpass-filtered
//! respiration channel. Per sample:
//!
//! 1. Analytic-signal approximation: for a narrow-band signal the Hilbert
//!    component is approximated by the scaled derivative,
//!    `H[x] ~ -(dx/dt) / omega_0`.
//! 2. Instantaneous phase `theta = atan2(H, x)`.
//! 3. Phase velocity `omega = d_theta / dt` after folding the phase step
//!    into (-pi, pi].
//! 4. Phase memory `omega_bar`: rolling mean of omega over the last
//!    [`MEMORY_SAMPLES`] values.
//! 5. Instability score `delta_phi = |omega - omega_bar|`.
//!
//! The first [`BASELINE_SAMPLES`] phase velocities of a session calibrate the
//! noise floor `sigma`; once frozen, instability is declared whenever
//! `delta_phi > alpha * sigma`. Because omega stays close to omega_bar during
//! rhythmic respiration, the score discriminates drifts, pauses, and burst
//! irregularities without user-specific thresholds.

use std::f32::consts::PI;

use tracing::debug;

/// Phase-memory window length (about 3 s at 50 Hz).
pub const MEMORY_SAMPLES: usize = 150;

/// Calibration window for the baseline noise floor (about 5 s at 50 Hz).
pub const BASELINE_SAMPLES: usize = 250;

/// Angular centre frequency of the breathing passband (0.3 Hz).
const OMEGA_0: f32 = 2.0 * PI * 0.3;

/// Lower bound on the calibrated sigma, preserved even on pathological
/// still periods.
const SIGMA_FLOOR: f32 = 1e-4;

/// Streaming phase-memory operator.
#[derive(Debug, Clone)]
pub struct PhaseMemoryOperator {
    /// Sample period in seconds.
    dt: f32,
    /// Sensitivity of the detection threshold `alpha * sigma`.
    alpha: f32,

    prev_x: f32,
    prev_theta: f32,
    initialized: bool,

    omega_ring: [f32; MEMORY_SAMPLES],
    omega_idx: usize,
    omega_sum: f32,
    omega_count: usize,

    baseline: [f32; BASELINE_SAMPLES],
    baseline_count: usize,
    baseline_ready: bool,
    sigma_omega: f32,

    delta_phi: f32,
}

impl PhaseMemoryOperator {
    pub fn new(sample_rate_hz: f32, alpha: f32) -> Self {
        Self {
            dt: 1.0 / sample_rate_hz,
            alpha,
            prev_x: 0.0,
            prev_theta: 0.0,
            initialized: false,
            omega_ring: [0.0; MEMORY_SAMPLES],
            omega_idx: 0,
            omega_sum: 0.0,
            omega_count: 0,
            baseline: [0.0; BASELINE_SAMPLES],
            baseline_count: 0,
            baseline_ready: false,
            // safe non-zero default until calibrated
            sigma_omega: 1.0,
            delta_phi: 0.0,
        }
    }

    /// Feed one bandpass-filtered sample and return the current
    /// instability score.
    pub fn update(&mut self, x: f32) -> f32 {
        if !self.initialized {
            self.prev_x = x;
            self.prev_theta = 0.0;
            self.initialized = true;
            return 0.0;
        }

        // Hilbert component via the derivative approximation
        let dx = x - self.prev_x;
        let h_x = -dx / (OMEGA_0 * self.dt);
        self.prev_x = x;

        // atan2(0, 0) = 0 on a dead channel; the phase step stays bounded
        let theta = h_x.atan2(x);

        let d_theta = fold_phase_delta(theta - self.prev_theta);
        let omega = d_theta / self.dt;
        self.prev_theta = theta;

        // Rolling mean over the memory window
        let outgoing = self.omega_ring[self.omega_idx];
        self.omega_ring[self.omega_idx] = omega;
        self.omega_sum += omega - outgoing;
        self.omega_idx = (self.omega_idx + 1) % MEMORY_SAMPLES;
        if self.omega_count < MEMORY_SAMPLES {
            self.omega_count += 1;
        }

        let omega_mean = if self.omega_count > 0 {
            self.omega_sum / self.omega_count as f32
        } else {
            omega
        };

        self.delta_phi = (omega - omega_mean).abs();

        if !self.baseline_ready {
            self.baseline[self.baseline_count] = omega;
            self.baseline_count += 1;
            if self.baseline_count >= BASELINE_SAMPLES {
                self.freeze_baseline();
            }
        }

        self.delta_phi
    }

    /// Compute and freeze sigma over the filled calibration window.
    fn freeze_baseline(&mut self) {
        let n = BASELINE_SAMPLES as f32;
        let mean = self.baseline.iter().sum::<f32>() / n;
        let var = self
            .baseline
            .iter()
            .map(|&w| {
                let diff = w - mean;
                diff * diff
            })
            .sum::<f32>()
            / n;
        self.sigma_omega = var.sqrt().max(SIGMA_FLOOR);
        self.baseline_ready = true;
        debug!(sigma = self.sigma_omega, "phase baseline calibrated");
    }

    /// Latest instability score `|omega - omega_bar|` in rad/s.
    pub fn instability_score(&self) -> f32 {
        self.delta_phi
    }

    /// True when the score exceeds `alpha * sigma` after calibration.
    pub fn instability_detected(&self) -> bool {
        self.baseline_ready && self.delta_phi > self.alpha * self.sigma_omega
    }

    /// Calibrated noise floor; fixed for the remainder of the session once
    /// the calibration window fills.
    pub fn baseline_sigma(&self) -> f32 {
        self.sigma_omega
    }

    pub fn baseline_ready(&self) -> bool {
        self.baseline_ready
    }

    /// Clear all state; the next sample starts a fresh calibration.
    pub fn reset(&mut self) {
        self.prev_x = 0.0;
        self.prev_theta = 0.0;
        self.initialized = false;
        self.omega_ring.fill(0.0);
        self.omega_idx = 0;
        self.omega_sum = 0.0;
        self.omega_count = 0;
        self.baseline.fill(0.0);
        self.baseline_count = 0;
        self.baseline_ready = false;
        self.sigma_omega = 1.0;
        self.delta_phi = 0.0;
    }
}

/// Fold a phase difference into (-pi, pi].
fn fold_phase_delta(mut d: f32) -> f32 {
    while d > PI {
        d -= 2.0 * PI;
    }
    while d < -PI {
        d += 2.0 * PI;
    }
    d
}
