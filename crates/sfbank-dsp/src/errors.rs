//! Error types for the sfbank-dsp crate.

use thiserror::Error;

/// Errors that can occur while reshaping sample data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    /// The resampler was handed a sample with no frames.
    #[error("Cannot resample an empty sample")]
    EmptySample,

    /// One of the rates driving the resampling ratio is zero or negative.
    #[error(
        "Invalid resampling rates: sample rate {sample_rate} Hz, root {root_freq} mHz, output {output_rate} Hz"
    )]
    InvalidRate {
        sample_rate: u32,
        root_freq: i32,
        output_rate: u32,
    },

    /// The resampled sample would be empty or unreasonably long.
    #[error("Resampled length of {0} frames is out of range")]
    ResampleLength(usize),
}

/// Result type alias using DspError.
pub type Result<T> = std::result::Result<T, DspError>;
