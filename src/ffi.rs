//! FFI bindings for respiro-core
//!
//! C-compatible surface consumed by the mobile-platform adapters. The engine
//! is exposed as an opaque handle; every function is null-tolerant, rejects
//! non-finite sensor input, and contains internal panics so the caller never
//! observes a failure. The metrics struct layout and enum values are part of
//! the stable ABI (see [`crate::types`]).

use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};

use crate::engine::RespiroEngine;
use crate::types::SleepMetrics;

/// Opaque handle to a [`RespiroEngine`].
pub struct RespiroEngineHandle {
    engine: RespiroEngine,
}

/// Create a new engine instance.
///
/// # Safety
/// - Returns a pointer to a newly allocated engine, or NULL on failure.
/// - Must be freed with `respiro_destroy`.
#[no_mangle]
pub unsafe extern "C" fn respiro_create() -> *mut RespiroEngineHandle {
    let handle = panic::catch_unwind(|| {
        Box::new(RespiroEngineHandle {
            engine: RespiroEngine::new(),
        })
    });
    match handle {
        Ok(handle) => Box::into_raw(handle),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Destroy an engine instance and release all resources.
///
/// # Safety
/// - `handle` must be a pointer returned by `respiro_create`, or NULL.
/// - After this call the pointer is invalid; destroying NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn respiro_destroy(handle: *mut RespiroEngineHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Reset internal state and begin a new monitoring session.
///
/// # Safety
/// - `handle` must be a valid engine pointer or NULL (no-op).
#[no_mangle]
pub unsafe extern "C" fn respiro_start_session(
    handle: *mut RespiroEngineHandle,
    timestamp_ms: u64,
) {
    if handle.is_null() {
        return;
    }
    let engine = &mut (*handle).engine;
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        engine.start_session(timestamp_ms);
    }));
}

/// Feed a gyroscope sample (rad/s or device-native units).
///
/// Non-finite components are silently rejected.
///
/// # Safety
/// - `handle` must be a valid engine pointer or NULL (no-op).
#[no_mangle]
pub unsafe extern "C" fn respiro_feed_gyro(
    handle: *mut RespiroEngineHandle,
    x: f32,
    y: f32,
    z: f32,
    timestamp_ms: u64,
) {
    if handle.is_null() {
        return;
    }
    if !x.is_finite() || !y.is_finite() || !z.is_finite() {
        return;
    }
    let engine = &mut (*handle).engine;
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        engine.feed_gyro(x, y, z, timestamp_ms);
    }));
}

/// Feed an accelerometer sample (m/s^2 or device-native units).
///
/// Non-finite components are silently rejected.
///
/// # Safety
/// - `handle` must be a valid engine pointer or NULL (no-op).
#[no_mangle]
pub unsafe extern "C" fn respiro_feed_accel(
    handle: *mut RespiroEngineHandle,
    x: f32,
    y: f32,
    z: f32,
    timestamp_ms: u64,
) {
    if handle.is_null() {
        return;
    }
    if !x.is_finite() || !y.is_finite() || !z.is_finite() {
        return;
    }
    let engine = &mut (*handle).engine;
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        engine.feed_accel(x, y, z, timestamp_ms);
    }));
}

/// Retrieve the latest respiratory and sleep metrics.
///
/// On NULL handle or internal failure, `out_metrics` is filled with the safe
/// zeroed snapshot (stage and quality Unknown).
///
/// # Safety
/// - `handle` must be a valid engine pointer or NULL.
/// - `out_metrics` must point to writable memory for one `SleepMetrics`,
///   or be NULL (no-op).
#[no_mangle]
pub unsafe extern "C" fn respiro_get_metrics(
    handle: *mut RespiroEngineHandle,
    timestamp_ms: u64,
    out_metrics: *mut SleepMetrics,
) {
    if out_metrics.is_null() {
        return;
    }
    if handle.is_null() {
        *out_metrics = SleepMetrics::default();
        return;
    }
    let engine = &(*handle).engine;
    let metrics = panic::catch_unwind(AssertUnwindSafe(|| engine.metrics(timestamp_ms)));
    *out_metrics = metrics.unwrap_or_default();
}

/// Get the library version string.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn respiro_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SignalQuality, SleepStage};
    use std::f32::consts::PI;
    use std::ffi::CStr;

    #[test]
    fn test_create_destroy_lifecycle() {
        unsafe {
            let handle = respiro_create();
            assert!(!handle.is_null());
            respiro_destroy(handle);

            // destroying NULL is a no-op
            respiro_destroy(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_version_string() {
        unsafe {
            let version = respiro_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, "1.0.0");
        }
    }

    #[test]
    fn test_null_handle_safety() {
        unsafe {
            let null = std::ptr::null_mut();
            respiro_start_session(null, 0);
            respiro_feed_gyro(null, 0.1, 0.1, 0.1, 0);
            respiro_feed_accel(null, 0.0, 0.0, 9.81, 0);

            let mut metrics = SleepMetrics {
                breathing_rate_bpm: 99.0,
                ..Default::default()
            };
            respiro_get_metrics(null, 0, &mut metrics);
            assert_eq!(metrics.breathing_rate_bpm, 0.0);
            assert_eq!(metrics.current_stage, SleepStage::Unknown);
            assert_eq!(metrics.signal_quality, SignalQuality::Unknown);
        }
    }

    #[test]
    fn test_null_out_pointer_is_noop() {
        unsafe {
            let handle = respiro_create();
            respiro_get_metrics(handle, 0, std::ptr::null_mut());
            respiro_destroy(handle);
        }
    }

    #[test]
    fn test_invalid_input_rejected_at_boundary() {
        unsafe {
            let handle = respiro_create();
            respiro_start_session(handle, 0);

            respiro_feed_accel(handle, f32::NAN, 0.0, 9.81, 0);
            respiro_feed_accel(handle, 0.0, f32::INFINITY, 9.81, 20);
            respiro_feed_gyro(handle, f32::NEG_INFINITY, 0.0, 0.0, 40);

            let mut metrics = SleepMetrics::default();
            respiro_get_metrics(handle, 100, &mut metrics);
            assert_eq!(metrics.breath_cycles_detected, 0);
            assert_eq!(metrics.current_stage, SleepStage::Unknown);

            respiro_destroy(handle);
        }
    }

    #[test]
    fn test_end_to_end_breathing_session() {
        unsafe {
            let handle = respiro_create();
            respiro_start_session(handle, 0);

            // 30 s of 15 BPM breathing at 50 Hz
            for i in 0..1500u64 {
                let t_ms = i * 20;
                let t = t_ms as f32 / 1000.0;
                let z = 9.81 + 0.1 * (2.0 * PI * 0.25 * t).sin();
                respiro_feed_gyro(handle, 0.01, 0.01, 0.01, t_ms);
                respiro_feed_accel(handle, 0.0, 0.0, z, t_ms);
            }

            let mut metrics = SleepMetrics::default();
            respiro_get_metrics(handle, 30_000, &mut metrics);
            assert!(metrics.breath_cycles_detected > 0);
            assert!(metrics.confidence > 0.0);
            assert!(metrics.breathing_rate_bpm >= 0.0);

            // restarting the session clears the counters
            respiro_start_session(handle, 0);
            respiro_get_metrics(handle, 0, &mut metrics);
            assert_eq!(metrics.breath_cycles_detected, 0);
            assert_eq!(metrics.instability_score, 0.0);

            respiro_destroy(handle);
        }
    }
}
