//! One-pole low-pass filter applied to sample data at load time.
//!
//! ```text
//! y(n) = A * x(n) + B * y(n - 1)
//! A    = 2π · cutoff · 2.5 / rate
//! B    = exp(-A / rate)
//! ```
//!
//! Both coefficients are damped by [`LOWPASS_DAMPING`] to keep the output
//! from ringing over full scale on bright samples.

use std::f64::consts::PI;

/// Multiplier applied to both filter coefficients.
pub const LOWPASS_DAMPING: f64 = 0.8;

/// Filter `data` in place.
///
/// Returns `false` and leaves the data untouched when the cutoff exceeds
/// twice the sample rate (nothing audible would be removed) or when the
/// sample rate is zero. Output is clamped to the 16-bit range.
///
/// `resonance` is carried for a future two-pole variant and has no effect.
pub fn lowpass_in_place(data: &mut [i16], sample_rate: u32, cutoff_hz: i32, resonance: f32) -> bool {
    if sample_rate == 0 || i64::from(cutoff_hz) > i64::from(sample_rate) * 2 {
        log::debug!(
            "Skipping low-pass: cutoff {} Hz at sample rate {} Hz",
            cutoff_hz,
            sample_rate
        );
        return false;
    }

    let rate = f64::from(sample_rate);
    let a = 2.0 * PI * f64::from(cutoff_hz) * 2.5 / rate;
    let b = (-a / rate).exp();
    let (a, b) = (a * LOWPASS_DAMPING, b * LOWPASS_DAMPING);
    log::trace!(
        "Low-pass {} frames at {} Hz (A={:.4}, B={:.4}, Q={})",
        data.len(),
        cutoff_hz,
        a,
        b,
        resonance
    );

    let mut previous = 0.0f64;
    for sample in data.iter_mut() {
        let y = (a * f64::from(*sample) + b * previous)
            .clamp(f64::from(i16::MIN), f64::from(i16::MAX));
        *sample = y as i16;
        previous = f64::from(*sample);
    }
    true
}
