//! Voice compilation.
//!
//! Turns one fully merged [`Layer`] and the sample it references into a
//! [`SampleSynthRecord`]: addressing, pitch, envelope, pan, modulation and
//! filter settings in the mixer's units, plus the file location of the PCM.

pub mod envelope;
pub mod filter;
pub mod modulation;
pub mod pitch;
pub mod units;

use sfbank_dsp::{note_frequency, FRACTION_BITS};

use crate::config::SynthConfig;
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::layer::{Layer, PackedRange};
use crate::parser::{Bank, SampleInfo};
use crate::types::{Envelope, SampleModes, SampleParams, SampleSynthRecord};

pub use units::{units_for, FormatUnits, Sf1Units, Sf2Units};

/// Default scale tuning in cents per key.
pub const DEFAULT_SCALE_TUNING: i32 = 100;

/// Centre pan position.
pub const CENTER_PAN: i8 = 64;

/// Sample-modes amount for a loop that plays through the release.
const LOOP_CONTINUOUS: i16 = 1;
/// Sample-modes amount for a loop whose tail after the loop end is dropped.
const LOOP_STRIP_TAIL: i16 = 3;

/// Sample positions after layer offsets, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Addressing {
    /// Absolute start in the PCM blob
    start: i64,
    /// Relative to `start`
    end: i64,
    loop_start: i64,
    loop_end: i64,
}

fn address_delta(layer: &Layer, coarse: Generator, fine: Generator) -> i64 {
    (i64::from(layer.amount(coarse)) << 16) + i64::from(layer.amount(fine))
}

fn addressing(layer: &Layer, sample: &SampleInfo) -> Addressing {
    let start = i64::from(sample.start)
        + address_delta(layer, Generator::StartAddrsCoarseOffset, Generator::StartAddrsOffset);
    let relative = |base: i32, coarse, fine| i64::from(base) + address_delta(layer, coarse, fine) - start;
    Addressing {
        start,
        end: relative(sample.end, Generator::EndAddrsCoarseOffset, Generator::EndAddrsOffset),
        loop_start: relative(
            sample.loop_start,
            Generator::StartloopAddrsCoarseOffset,
            Generator::StartloopAddrsOffset,
        ),
        loop_end: relative(
            sample.loop_end,
            Generator::EndloopAddrsCoarseOffset,
            Generator::EndloopAddrsOffset,
        ),
    }
}

/// Compiles merged layers of one bank.
pub struct Compiler<'a> {
    bank: &'a Bank,
    config: &'a SynthConfig,
    units: &'static dyn FormatUnits,
}

impl<'a> Compiler<'a> {
    pub fn new(bank: &'a Bank, config: &'a SynthConfig) -> Self {
        Self {
            bank,
            config,
            units: units_for(bank.format),
        }
    }

    /// Compile one sample layer.
    ///
    /// Returns `Ok(None)` for layers that produce no playable sample: ROM
    /// samples, and samples whose offsets fall outside the PCM blob.
    /// `note_to_use` fixes the pitch of drum voices.
    pub fn compile(&self, layer: &Layer, note_to_use: Option<u8>) -> Result<Option<SampleSynthRecord>> {
        let sample_index = usize::from(layer.amount(Generator::SampleId) as u16);
        let sample = self
            .bank
            .samples
            .get(sample_index)
            .ok_or_else(|| Error::bad_reference("igen", sample_index, self.bank.samples.len()))?;

        if sample.is_rom() {
            log::debug!("Skipping ROM sample '{}'", sample.name);
            return Ok(None);
        }

        let addr = addressing(layer, sample);
        let blob_frames = i64::from(self.bank.sample_data_len / 2);
        if addr.start < 0 || addr.end <= 0 || addr.start + addr.end > blob_frames {
            log::warn!(
                "Skipping sample '{}': frames {}..{} fall outside the {} frame sample data",
                sample.name,
                addr.start,
                addr.start + addr.end,
                blob_frames
            );
            return Ok(None);
        }

        let key_range = layer.range(Generator::KeyRange).unwrap_or(PackedRange::FULL);
        let velocity_range = layer.range(Generator::VelRange).unwrap_or(PackedRange::FULL);
        let scale_tuning = layer
            .get(Generator::ScaleTuning)
            .map(|amount| self.units.scale_tuning(amount))
            .unwrap_or(DEFAULT_SCALE_TUNING);

        let mut modes = SampleModes::BIT16;
        let mut envelope = Envelope::default();
        let mut data_length = addr.end;
        let sample_modes = layer.amount(Generator::SampleModes);
        if sample_modes == LOOP_CONTINUOUS || sample_modes == LOOP_STRIP_TAIL {
            modes |= SampleModes::LOOPING | SampleModes::SUSTAIN;
            if self.config.envelope {
                modes |= SampleModes::ENVELOPE;
                envelope = envelope::volume_envelope(self.units, layer, self.config);
            }
            if sample_modes == LOOP_STRIP_TAIL {
                data_length = addr.loop_end + 1;
            }
        }

        let params = SampleParams {
            loop_start: addr.loop_start << FRACTION_BITS,
            loop_end: addr.loop_end << FRACTION_BITS,
            data_length: data_length << FRACTION_BITS,
            sample_rate: sample.sample_rate,
            low_freq: note_frequency(key_range.low),
            high_freq: note_frequency(key_range.high),
            root_freq: pitch::calc_root_freq(self.units, layer, sample, scale_tuning),
            key_range,
            velocity_range,
            scale_tuning,
            volume: self.units.volume(layer.amount(Generator::InitialAttenuation)),
            panning: layer
                .get(Generator::Pan)
                .map(|amount| self.units.pan(amount))
                .unwrap_or(CENTER_PAN),
            envelope,
            tremolo: if self.config.tremolo {
                modulation::tremolo(self.units, layer, self.config)
            } else {
                None
            },
            vibrato: if self.config.vibrato {
                modulation::vibrato(self.units, layer, self.config)
            } else {
                None
            },
            modes,
            note_to_use,
        };

        let record = SampleSynthRecord {
            sample_index,
            sample_name: sample.name.clone(),
            file_offset: self.bank.sample_data_offset + (addr.start as u64) * 2,
            byte_len: (addr.end as u64) * 2,
            params,
            cutoff_hz: filter::cutoff_hz(self.units, layer),
            resonance: filter::resonance(self.units, layer),
            loaded: None,
        };
        log::trace!(
            "Compiled sample '{}': {} bytes at {}, root {} mHz",
            record.sample_name,
            record.byte_len,
            record.file_offset,
            record.params.root_freq
        );
        Ok(Some(record))
    }
}
