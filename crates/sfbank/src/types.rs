//! Voice types handed to the synthesis engine.
//!
//! A [`ResolvedVoice`] is what the registry stores after a bank is loaded:
//! compiled parameters and the file location of each sample's PCM. An
//! [`Instrument`] is what a lookup returns once that PCM has been read.

use std::sync::Arc;

use bitflags::bitflags;
use sfbank_dsp::FRACTION_BITS;

use crate::layer::PackedRange;

/// Bank number of the drum kit.
pub const DRUM_BANK: u16 = 128;

/// Number of volume envelope stages.
pub const ENVELOPE_STAGES: usize = 6;

bitflags! {
    /// Playback mode flags understood by the mixer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SampleModes: u8 {
        const BIT16 = 1 << 0;
        const UNSIGNED = 1 << 1;
        const LOOPING = 1 << 2;
        const PINGPONG = 1 << 3;
        const REVERSE = 1 << 4;
        const SUSTAIN = 1 << 5;
        const ENVELOPE = 1 << 6;
    }
}

/// Six-stage volume envelope: target offsets and ramp rates, both in
/// the mixer's 15.15-style fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Envelope {
    pub offsets: [i32; ENVELOPE_STAGES],
    /// Ramp magnitudes; the mixer picks the direction from the offsets.
    pub rates: [i32; ENVELOPE_STAGES],
}

/// Amplitude modulation from the modulation LFO.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tremolo {
    /// Linear gain at full modulation depth
    pub depth: f32,
    /// Sine table increment per control update
    pub phase_increment: i32,
    pub sweep_increment: i32,
}

/// Pitch modulation from the vibrato LFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vibrato {
    /// Depth, 256 units per 400 cents
    pub depth: i8,
    /// Output samples per vibrato table step
    pub control_ratio: i32,
    pub sweep_increment: i32,
}

/// Compiled synthesis parameters of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleParams {
    /// Loop start, fixed point, relative to the sample start
    pub loop_start: i64,
    /// Loop end, fixed point, relative to the sample start
    pub loop_end: i64,
    /// Playable length, fixed point
    pub data_length: i64,
    /// Rate the PCM was recorded at (Hz)
    pub sample_rate: i32,
    /// Lowest frequency this sample covers (mHz)
    pub low_freq: i32,
    /// Highest frequency this sample covers (mHz)
    pub high_freq: i32,
    /// Frequency the PCM sounds at when played unshifted (mHz)
    pub root_freq: i32,
    pub key_range: PackedRange,
    pub velocity_range: PackedRange,
    /// Cents per key step (100 is equal temperament)
    pub scale_tuning: i32,
    /// Linear output volume
    pub volume: f32,
    /// 0 is hard left, 64 centre, 127 hard right
    pub panning: i8,
    pub envelope: Envelope,
    pub tremolo: Option<Tremolo>,
    pub vibrato: Option<Vibrato>,
    pub modes: SampleModes,
    /// Fixed note for drum voices
    pub note_to_use: Option<u8>,
}

impl SampleParams {
    /// Playable length in whole frames.
    pub fn frames(&self) -> usize {
        (self.data_length >> FRACTION_BITS).max(0) as usize
    }

    pub fn is_looping(&self) -> bool {
        self.modes.contains(SampleModes::LOOPING)
    }
}

/// A sample with its PCM in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSample {
    pub params: SampleParams,
    /// Frames followed by three zero guard frames
    pub data: Arc<[i16]>,
}

/// One sample of a resolved voice: compiled parameters plus where its PCM lives.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSynthRecord {
    /// Row in the bank's sample table
    pub sample_index: usize,
    pub sample_name: String,
    /// Absolute file offset of the first PCM byte
    pub file_offset: u64,
    /// PCM length in bytes
    pub byte_len: u64,
    pub params: SampleParams,
    /// Load-time low-pass cutoff in Hz, 0 when disabled
    pub cutoff_hz: i32,
    /// Filter resonance (currently not applied)
    pub resonance: f32,
    pub(crate) loaded: Option<LoadedSample>,
}

impl SampleSynthRecord {
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Cached PCM and final parameters, once materialized.
    pub fn loaded(&self) -> Option<&LoadedSample> {
        self.loaded.as_ref()
    }

    /// Number of frames stored in the file for this sample.
    pub fn stored_frames(&self) -> usize {
        (self.byte_len / 2) as usize
    }
}

/// A playable unit registered under (bank, program, key).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVoice {
    pub bank: u16,
    pub program: u16,
    /// Drum voices are keyed, melodic voices are not
    pub key: Option<u8>,
    pub order: i32,
    /// Name of the first instrument that contributed to this voice
    pub name: String,
    /// Index of the bank file this voice was loaded from
    pub source: usize,
    pub samples: Vec<SampleSynthRecord>,
}

impl ResolvedVoice {
    pub fn is_drum(&self) -> bool {
        self.bank == DRUM_BANK
    }

    pub fn is_loaded(&self) -> bool {
        !self.samples.is_empty() && self.samples.iter().all(SampleSynthRecord::is_loaded)
    }
}

/// A voice with all of its PCM loaded, ready for the mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub bank: u16,
    pub program: u16,
    pub key: Option<u8>,
    pub name: String,
    pub samples: Vec<LoadedSample>,
}
