//! Core types for the respiro-core pipeline
//!
//! This module defines the data structures that flow through the engine:
//! raw sensor samples, detected breath cycles, and the metrics snapshot
//! returned to callers. The snapshot struct and the two classification
//! enums are `repr(C)` / `repr(i32)` — their layout and integer values are
//! part of the stable C ABI consumed by mobile-platform adapters.

use serde::{Deserialize, Serialize};

/// One 3-axis sensor reading (accelerometer or gyroscope).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Sample timestamp in milliseconds (caller clock, expected monotonic).
    pub timestamp_ms: u64,
}

impl SensorSample {
    pub fn new(x: f32, y: f32, z: f32, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    /// Euclidean norm of the three components.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// True when all three components are finite (neither NaN nor infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detected breath cycle: a rising-edge peak at a physiologically
/// plausible distance from the previous peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathCycle {
    /// Time of the peak that closed the cycle (ms).
    pub timestamp_ms: u64,
    /// Time since the previous peak (ms).
    pub duration_ms: f32,
    /// Peak signal normalized by the windowed standard deviation.
    pub amplitude: f32,
}

/// Sleep stage classification.
///
/// Integer values are stable ABI contract; do not reorder.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Awake = 0,
    LightSleep = 1,
    DeepSleep = 2,
    RemSleep = 3,
    Unknown = 4,
}

/// Coarse signal-quality rating derived from SNR, regularity, and the
/// number of breath cycles observed.
///
/// Integer values are stable ABI contract; do not reorder.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Excellent = 0,
    Good = 1,
    Fair = 2,
    Poor = 3,
    Unknown = 4,
}

/// Snapshot of respiratory and sleep metrics.
///
/// Field order is part of the C ABI; it mirrors the binding header consumed
/// by the mobile adapters and must not change between patch releases.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepMetrics {
    /// Rule-based sleep stage.
    pub current_stage: SleepStage,
    /// Heuristic confidence in the snapshot, 0.0 - 1.0.
    pub confidence: f32,
    /// Instantaneous breathing rate, breaths per minute.
    pub breathing_rate_bpm: f32,
    /// Breathing regularity, 0.0 - 1.0 (higher = more consistent).
    pub breathing_regularity: f32,
    /// Movement intensity, 0.0 - 1.0 (higher = more movement).
    pub movement_intensity: f32,
    /// Breath cycles currently in the 60-second history window.
    pub breath_cycles_detected: i32,
    /// 1 when no breath cycle has been seen for longer than the apnea
    /// timeout, else 0.
    pub possible_apnea: i32,
    /// Overall signal-quality assessment.
    pub signal_quality: SignalQuality,
    /// Estimated signal-to-noise ratio of breath amplitudes.
    pub signal_noise_ratio: f32,
    /// Phase-memory divergence |omega - omega_bar| in rad/s.
    pub instability_score: f32,
    /// 1 when the divergence exceeds `alpha * sigma` after calibration.
    pub instability_detected: i32,
}

impl Default for SleepMetrics {
    /// Zero-filled snapshot with both classifications Unknown. This is the
    /// safe output used before any data arrives and on boundary failures.
    fn default() -> Self {
        Self {
            current_stage: SleepStage::Unknown,
            confidence: 0.0,
            breathing_rate_bpm: 0.0,
            breathing_regularity: 0.0,
            movement_intensity: 0.0,
            breath_cycles_detected: 0,
            possible_apnea: 0,
            signal_quality: SignalQuality::Unknown,
            signal_noise_ratio: 0.0,
            instability_score: 0.0,
            instability_detected: 0,
        }
    }
}
