//! Rule-based sleep staging and signal-quality assessment
//!
//! Both classifiers are deliberately simple rule ladders over already-derived
//! metrics; they hold no state and can be evaluated on every snapshot.

use crate::types::{SignalQuality, SleepStage};

/// Minimum breath cycles before either classifier commits to a label.
const MIN_CYCLES_TO_CLASSIFY: usize = 5;

/// Stateless rule-ladder classifier.
pub struct StageClassifier;

impl StageClassifier {
    /// Classify the sleep stage from movement and breathing regularity.
    ///
    /// The ladder is evaluated in order; movement dominates. Intensities in
    /// `[0.35, 0.4]` fall through to light sleep.
    pub fn classify(
        movement_intensity: f32,
        breathing_regularity: f32,
        cycle_count: usize,
    ) -> SleepStage {
        if cycle_count < MIN_CYCLES_TO_CLASSIFY {
            return SleepStage::Unknown;
        }

        if movement_intensity > 0.4 {
            return SleepStage::Awake;
        }

        if movement_intensity < 0.05 && breathing_regularity > 0.85 {
            return SleepStage::DeepSleep;
        }

        // characteristic rapid micro-movements
        if movement_intensity > 0.15 && movement_intensity < 0.35 {
            return SleepStage::RemSleep;
        }

        SleepStage::LightSleep
    }

    /// Rate overall signal quality from SNR, cycle count, and regularity.
    pub fn assess_quality(snr: f32, cycle_count: usize, regularity: f32) -> SignalQuality {
        if cycle_count < MIN_CYCLES_TO_CLASSIFY {
            return SignalQuality::Unknown;
        }

        if snr > 5.0 && regularity > 0.7 && cycle_count >= 20 {
            return SignalQuality::Excellent;
        }

        if snr > 3.0 && regularity > 0.5 && cycle_count >= 10 {
            return SignalQuality::Good;
        }

        if snr > 1.5 {
            return SignalQuality::Fair;
        }

        SignalQuality::Poor
    }
}
