//! Pre-resampling of fixed-pitch samples.
//!
//! Drum voices always sound at the same note, so their data can be brought
//! to the output rate once at load time instead of on every mix cycle.

use crate::errors::{DspError, Result};
use crate::tables::note_frequency;

/// Longest sample, in frames, the resampler will produce.
pub const MAX_RESAMPLED_FRAMES: usize = 1 << 24;

/// Output of [`pre_resample`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// Resampled frames, without guard samples.
    pub data: Vec<i16>,
    /// Input frames consumed per output frame. Loop points divide by this.
    pub step: f64,
}

/// Resample `data` so that it plays `note` at `output_rate` without further
/// pitch shifting.
///
/// `root_freq` is the pitch the sample was recorded at, in milli-Hertz.
/// Frames are linearly interpolated.
pub fn pre_resample(
    data: &[i16],
    sample_rate: u32,
    root_freq: i32,
    note: u8,
    output_rate: u32,
) -> Result<Resampled> {
    if data.is_empty() {
        return Err(DspError::EmptySample);
    }
    if sample_rate == 0 || output_rate == 0 || root_freq <= 0 {
        return Err(DspError::InvalidRate {
            sample_rate,
            root_freq,
            output_rate,
        });
    }

    let step = (f64::from(sample_rate) * f64::from(note_frequency(note)))
        / (f64::from(root_freq) * f64::from(output_rate));
    let frames = (data.len() as f64 / step) as usize;
    if frames == 0 || frames > MAX_RESAMPLED_FRAMES {
        return Err(DspError::ResampleLength(frames));
    }

    let last = data.len() - 1;
    let resampled = (0..frames)
        .map(|i| {
            let position = i as f64 * step;
            let index = position as usize;
            if index >= last {
                return data[last];
            }
            let frac = position - index as f64;
            let x0 = f64::from(data[index]);
            let x1 = f64::from(data[index + 1]);
            (x0 + (x1 - x0) * frac)
                .round()
                .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
        })
        .collect::<Vec<_>>();

    log::trace!(
        "Pre-resampled {} -> {} frames for note {} (step {:.5})",
        data.len(),
        resampled.len(),
        note,
        step
    );

    Ok(Resampled {
        data: resampled,
        step,
    })
}
