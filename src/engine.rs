//! Engine orchestration
//!
//! [`RespiroEngine`] owns every pipeline stage by value and advances them
//! push-on-ingest: each accelerometer sample flows through gravity removal,
//! the breathing bandpass, the phase-memory operator, and the peak detector.
//! Gyroscope samples only maintain a short window that is blended into the
//! respiration channel. Metrics are assembled lazily on query.
//!
//! The engine is single-threaded by design: no internal synchronization, no
//! suspension points, every call returns in bounded work. One instance per
//! monitored subject; instances share nothing.

use std::collections::VecDeque;

use tracing::debug;

use crate::classifier::StageClassifier;
use crate::config::EngineConfig;
use crate::detector::BreathPeakDetector;
use crate::error::ConfigError;
use crate::filter::{BandpassFilter, GravityTracker};
use crate::history::BreathHistory;
use crate::phase::PhaseMemoryOperator;
use crate::stats::SlidingStats;
use crate::types::{BreathCycle, SensorSample, SleepMetrics};

/// Raw sensor samples are retained for this long.
const SENSOR_WINDOW_MS: u64 = 5_000;

/// Scale applied to the gyroscope magnitude blended into the respiration
/// channel.
const GYRO_BLEND: f32 = 0.1;

/// Movement variance is reported only once this many magnitude samples have
/// accumulated.
const MIN_SAMPLES_FOR_MOVEMENT: usize = 10;

/// Movement variance to intensity scale factor.
const INTENSITY_SCALE: f32 = 10.0;

/// Cycle count at which snapshot confidence saturates.
const CONFIDENCE_TARGET_CYCLES: f32 = 20.0;

/// Real-time respiratory signal processing engine.
///
/// Feed it 3-axis accelerometer and gyroscope samples from a chest-mounted
/// device and query [`RespiroEngine::metrics`] at any time for the current
/// respiratory and sleep-stage snapshot.
#[derive(Debug)]
pub struct RespiroEngine {
    config: EngineConfig,

    accel_window: VecDeque<SensorSample>,
    gyro_window: VecDeque<SensorSample>,
    magnitude_stats: SlidingStats,

    gravity: GravityTracker,
    bandpass: BandpassFilter,
    phase_memory: PhaseMemoryOperator,
    detector: BreathPeakDetector,
    history: BreathHistory,

    current_bpm: f32,
    movement_variance: f32,
    session_start_ms: u64,
    last_breath_ms: u64,
}

impl RespiroEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        // the default configuration always validates
        Self::build(EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            config,
            accel_window: VecDeque::new(),
            gyro_window: VecDeque::new(),
            magnitude_stats: SlidingStats::new(),
            gravity: GravityTracker::new(),
            bandpass: BandpassFilter::new(),
            phase_memory: PhaseMemoryOperator::new(config.sample_rate_hz, config.alpha),
            detector: BreathPeakDetector::new(),
            history: BreathHistory::new(),
            current_bpm: 0.0,
            movement_variance: 0.0,
            session_start_ms: 0,
            last_breath_ms: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reset all pipeline state and begin a new monitoring session.
    ///
    /// Idempotent; may be called any number of times on one instance.
    pub fn start_session(&mut self, timestamp_ms: u64) {
        self.session_start_ms = timestamp_ms;
        self.accel_window.clear();
        self.gyro_window.clear();
        self.magnitude_stats.clear();
        self.gravity.reset();
        self.bandpass.reset();
        self.phase_memory.reset();
        self.detector.reset();
        self.history.clear();
        self.current_bpm = 0.0;
        self.movement_variance = 0.0;
        self.last_breath_ms = 0;
        debug!(timestamp_ms, "session started");
    }

    /// Timestamp passed to the most recent [`RespiroEngine::start_session`].
    pub fn session_start_ms(&self) -> u64 {
        self.session_start_ms
    }

    /// Feed one gyroscope sample. Non-finite components are silently
    /// dropped; valid samples only maintain the 5-second gyro window.
    pub fn feed_gyro(&mut self, x: f32, y: f32, z: f32, timestamp_ms: u64) {
        let sample = SensorSample::new(x, y, z, timestamp_ms);
        if !sample.is_finite() {
            return;
        }

        self.gyro_window.push_back(sample);
        while let Some(front) = self.gyro_window.front() {
            if timestamp_ms.saturating_sub(front.timestamp_ms) > SENSOR_WINDOW_MS {
                self.gyro_window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Feed one accelerometer sample and advance the whole pipeline.
    /// Non-finite components are silently dropped without touching state.
    pub fn feed_accel(&mut self, x: f32, y: f32, z: f32, timestamp_ms: u64) {
        let sample = SensorSample::new(x, y, z, timestamp_ms);
        if !sample.is_finite() {
            return;
        }

        let magnitude = sample.magnitude();
        self.accel_window.push_back(sample);
        self.magnitude_stats.push_back(magnitude);

        // magnitude stats and the raw window evict in lockstep
        while let Some(front) = self.accel_window.front() {
            if timestamp_ms.saturating_sub(front.timestamp_ms) > SENSOR_WINDOW_MS {
                self.magnitude_stats.pop_front();
                self.accel_window.pop_front();
            } else {
                break;
            }
        }

        // Scalar respiration channel: gravity-removed magnitude, lightly
        // blended with the latest angular-velocity magnitude.
        let mut chest_motion = self.gravity.apply(magnitude);
        if let Some(gyro) = self.gyro_window.back() {
            chest_motion += gyro.magnitude() * GYRO_BLEND;
        }

        let breathing_signal = self.bandpass.process(chest_motion);

        self.phase_memory.update(breathing_signal);

        if let Some(cycle) = self.detector.step(breathing_signal, timestamp_ms) {
            self.last_breath_ms = timestamp_ms;
            self.history.push(cycle);
            debug!(
                timestamp_ms,
                duration_ms = cycle.duration_ms,
                "breath cycle detected"
            );
        }

        self.current_bpm = self.history.breathing_rate_bpm();

        self.movement_variance = 0.0;
        if self.magnitude_stats.len() > MIN_SAMPLES_FOR_MOVEMENT {
            self.movement_variance = self.magnitude_stats.variance().max(0.0);
        }
    }

    /// Assemble the current metrics snapshot.
    ///
    /// Reflects every feed call completed before it in program order.
    pub fn metrics(&self, timestamp_ms: u64) -> SleepMetrics {
        let cycle_count = self.history.len();
        let regularity = self.history.regularity();
        let movement_intensity = (self.movement_variance * INTENSITY_SCALE).min(1.0);
        let snr = self.history.snr();

        let possible_apnea = self.last_breath_ms > 0
            && timestamp_ms.saturating_sub(self.last_breath_ms) > self.config.apnea_timeout_ms;

        SleepMetrics {
            current_stage: StageClassifier::classify(movement_intensity, regularity, cycle_count),
            confidence: (cycle_count as f32 / CONFIDENCE_TARGET_CYCLES).min(1.0),
            breathing_rate_bpm: self.current_bpm,
            breathing_regularity: regularity,
            movement_intensity,
            breath_cycles_detected: cycle_count as i32,
            possible_apnea: possible_apnea as i32,
            signal_quality: StageClassifier::assess_quality(snr, cycle_count, regularity),
            signal_noise_ratio: snr,
            instability_score: self.phase_memory.instability_score(),
            instability_detected: self.phase_memory.instability_detected() as i32,
        }
    }

    /// Detected breath cycles currently in the 60-second window.
    pub fn breath_history(&self) -> &VecDeque<BreathCycle> {
        self.history.cycles()
    }
}

impl Default for RespiroEngine {
    fn default() -> Self {
        Self::new()
    }
}
