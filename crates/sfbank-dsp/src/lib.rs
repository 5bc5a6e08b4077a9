//! Sample-domain DSP helpers for the sfbank SoundFont loader.
//!
//! This crate holds the pieces of voice preparation that operate on raw
//! numbers rather than on bank structure:
//!
//! - [`tables`] - MIDI note frequencies and fine pitch-bend ratios
//! - [`filter`] - the one-pole low-pass filter applied to PCM at load time
//! - [`resample`] - pre-resampling of fixed-pitch samples to the output rate
//!
//! # Example
//!
//! ```
//! use sfbank_dsp::{freq_table, lowpass_in_place};
//!
//! // A4 is 440 Hz, tables are in milli-Hertz.
//! assert_eq!(freq_table()[69], 440_000);
//!
//! let mut pcm = vec![1000i16; 64];
//! assert!(lowpass_in_place(&mut pcm, 44_100, 2_000, 0.0));
//! ```

pub mod errors;
pub mod filter;
pub mod resample;
pub mod tables;

pub use errors::*;
pub use filter::{lowpass_in_place, LOWPASS_DAMPING};
pub use resample::{pre_resample, Resampled, MAX_RESAMPLED_FRAMES};
pub use tables::{bend_fine, freq_table, note_frequency, FRACTION_BITS};
