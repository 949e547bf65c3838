//! respiro-core - Real-time respiratory signal processing engine
//!
//! Ingests 3-axis accelerometer and gyroscope samples from a chest-mounted
//! mobile device and derives respiratory and sleep-stage metrics through a
//! deterministic streaming pipeline: gravity estimation → breathing-band
//! filtering → analytic-signal phase tracking → phase-memory divergence →
//! adaptive breath-peak detection → metric aggregation.
//!
//! ## Modules
//!
//! - **filter**: breathing-band biquad and gravity tracker
//! - **stats**: O(1) incremental windowed statistics
//! - **phase**: phase-memory instability operator (ΔΦ score)
//! - **detector**: adaptive-threshold breath-peak detector
//! - **history**: sliding breath-cycle window and derived metrics
//! - **classifier**: rule-based sleep staging and signal quality
//! - **engine**: session lifecycle and pipeline orchestration
//!
//! ## Example
//!
//! ```
//! use respiro_core::RespiroEngine;
//!
//! let mut engine = RespiroEngine::new();
//! engine.start_session(0);
//!
//! // in the sensor callback loop, at ~50 Hz:
//! engine.feed_gyro(0.01, 0.0, 0.0, 20);
//! engine.feed_accel(0.0, 0.0, 9.81, 20);
//!
//! let metrics = engine.metrics(20);
//! assert_eq!(metrics.breath_cycles_detected, 0);
//! ```

pub mod classifier;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod filter;
pub mod history;
pub mod phase;
pub mod stats;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use engine::RespiroEngine;
pub use error::ConfigError;
pub use types::{BreathCycle, SensorSample, SignalQuality, SleepMetrics, SleepStage};

/// Engine version reported over the ABI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
