//! SoundFont bank support for wavetable synthesizers.
//!
//! This crate turns SoundFont banks (format 1 `.sbk` and format 2 `.sf2`)
//! into voices a sample-playback engine can use directly:
//! - RIFF container walking and table decoding
//! - Generator layering across preset, instrument and sample levels
//! - Compilation of generator values into engine units (fixed-point
//!   addressing, envelope rates, LFO increments, filter cutoff)
//! - A voice registry with exclusion/order rules and lazy PCM loading
//!
//! # Architecture
//!
//! Loading a bank runs in one pass: [`parser`] reads the file into a
//! [`parser::Bank`], [`resolver`] merges each preset's layers down to
//! individual samples, and [`compiler`] converts every merged [`Layer`]
//! into a [`SampleSynthRecord`]. The [`SoundfontManager`] groups those
//! records into [`ResolvedVoice`]s. The bank tables are dropped once the
//! pass ends; only the compiled voices and the file handle remain.
//!
//! PCM is read on demand by [`SoundfontManager::materialize`], which also
//! applies the optional load-time low-pass filter and pre-resamples
//! fixed-pitch drum samples.
//!
//! # Example
//!
//! ```ignore
//! use sfbank::{SoundfontManager, SynthConfig};
//!
//! let mut manager = SoundfontManager::new(SynthConfig::default());
//! manager.exclude(0, 57, -1);
//! manager.load_bank("banks/General.sf2", 0)?;
//!
//! // Acoustic grand piano
//! if let Some(piano) = manager.lookup_and_materialize(0, 0, 0, None) {
//!     for sample in &piano.samples {
//!         println!("{} frames at {} Hz", sample.params.frames(), sample.params.sample_rate);
//!     }
//! }
//!
//! // Kick drum from the drum kit
//! let kick = manager.lookup_and_materialize(0, sfbank::DRUM_BANK, 0, Some(36));
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod generator;
pub mod layer;
pub mod loader;
pub mod manager;
pub mod parser;
pub mod resolver;
pub mod rules;
pub mod types;

#[cfg(test)]
mod testing;

pub use compiler::Compiler;
pub use config::SynthConfig;
pub use error::{Error, Result};
pub use generator::Generator;
pub use layer::{append_layer, Layer, PackedRange};
pub use manager::SoundfontManager;
pub use parser::{load_bank_file, parse_bank, Bank, FormatVersion};
pub use resolver::{resolve_preset, ResolvedLayer};
pub use rules::{RuleSet, VoicePattern};
pub use types::*;
