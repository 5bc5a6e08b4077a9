//! Decoded bank tables.
//!
//! A [`Bank`] is the raw content of one SoundFont file after container
//! parsing: header tables, bag and generator lists, sample descriptors and
//! the location of the PCM blob. No inheritance or unit conversion has been
//! applied yet.
//!
//! Header and bag tables end with a sentinel row whose index field closes
//! the span of the last real row, so row `i` owns `row[i].index..row[i+1].index`.

use std::ops::Range;

use bitflags::bitflags;

use crate::error::{Error, Result};

/// On-disk schema generation of a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Original SBK layout: 16-byte sample rows, names in `snam`
    V1,
    /// SF2 layout: 46-byte sample rows with embedded names
    V2,
}

impl FormatVersion {
    /// Map an `ifil` major version onto a format. Zero is not a version.
    pub fn from_major(major: u16) -> Option<Self> {
        match major {
            0 => None,
            1 => Some(FormatVersion::V1),
            _ => Some(FormatVersion::V2),
        }
    }

    /// Width of one row in the `shdr` table.
    pub fn sample_row_size(self) -> usize {
        match self {
            FormatVersion::V1 => 16,
            FormatVersion::V2 => 46,
        }
    }
}

/// Version stamp from the `ifil` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTag {
    pub major: u16,
    pub minor: u16,
}

/// One `phdr` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetHeader {
    /// Preset name
    pub name: String,
    /// MIDI program number
    pub program: u16,
    /// MIDI bank number (128 is the drum bank)
    pub bank: u16,
    /// First bag in `pbag`
    pub bag_index: u16,
}

/// One `inst` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentHeader {
    pub name: String,
    /// First bag in `ibag`
    pub bag_index: u16,
}

/// One `pgen`/`igen` row: an operator and its raw 16-bit amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorRecord {
    pub operator: i16,
    pub amount: i16,
}

bitflags! {
    /// `sfSampleType` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SampleType: u16 {
        const MONO = 0x0001;
        const RIGHT = 0x0002;
        const LEFT = 0x0004;
        const LINKED = 0x0008;
        /// Data lives in a ROM the file does not carry.
        const ROM = 0x8000;
    }
}

/// One `shdr` row. Positions are in sample frames from the start of the
/// PCM blob.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInfo {
    pub name: String,
    pub start: i32,
    pub end: i32,
    pub loop_start: i32,
    pub loop_end: i32,
    pub sample_rate: i32,
    /// MIDI note the sample was recorded at
    pub original_pitch: u8,
    /// Pitch correction in cents
    pub pitch_correction: i8,
    pub sample_link: u16,
    pub sample_type: SampleType,
}

impl SampleInfo {
    /// Whether the PCM data lives outside the file.
    pub fn is_rom(&self) -> bool {
        self.sample_type.contains(SampleType::ROM)
    }
}

/// Raw content of one SoundFont file.
#[derive(Debug, Clone)]
pub struct Bank {
    pub version: VersionTag,
    pub format: FormatVersion,
    /// `INAM` bank name, if present
    pub name: Option<String>,
    /// Presets, including the trailing sentinel row
    pub presets: Vec<PresetHeader>,
    /// Generator start index of each preset bag, including the sentinel
    pub preset_bags: Vec<u16>,
    pub preset_generators: Vec<GeneratorRecord>,
    /// Instruments, including the trailing sentinel row
    pub instruments: Vec<InstrumentHeader>,
    /// Generator start index of each instrument bag, including the sentinel
    pub instrument_bags: Vec<u16>,
    pub instrument_generators: Vec<GeneratorRecord>,
    pub samples: Vec<SampleInfo>,
    /// Absolute file offset of the first PCM byte
    pub sample_data_offset: u64,
    /// Length of the PCM blob in bytes
    pub sample_data_len: u32,
}

impl Bank {
    /// Number of real presets (the sentinel row excluded).
    pub fn preset_count(&self) -> usize {
        self.presets.len().saturating_sub(1)
    }

    /// Number of real instruments (the sentinel row excluded).
    pub fn instrument_count(&self) -> usize {
        self.instruments.len().saturating_sub(1)
    }

    /// Real presets in file order.
    pub fn presets(&self) -> impl Iterator<Item = (usize, &PresetHeader)> {
        self.presets.iter().take(self.preset_count()).enumerate()
    }

    /// Bags owned by `preset`.
    pub fn preset_bag_range(&self, preset: usize) -> Result<Range<usize>> {
        span(
            "phdr",
            self.presets.iter().map(|p| p.bag_index).collect::<Vec<_>>().as_slice(),
            preset,
            self.preset_bags.len(),
        )
    }

    /// Bags owned by `instrument`.
    pub fn instrument_bag_range(&self, instrument: usize) -> Result<Range<usize>> {
        span(
            "inst",
            self.instruments.iter().map(|i| i.bag_index).collect::<Vec<_>>().as_slice(),
            instrument,
            self.instrument_bags.len(),
        )
    }

    /// Generators of preset bag `bag`.
    pub fn preset_bag_generators(&self, bag: usize) -> Result<&[GeneratorRecord]> {
        let range = span("pbag", &self.preset_bags, bag, self.preset_generators.len() + 1)?;
        Ok(&self.preset_generators[range])
    }

    /// Generators of instrument bag `bag`.
    pub fn instrument_bag_generators(&self, bag: usize) -> Result<&[GeneratorRecord]> {
        let range = span(
            "ibag",
            &self.instrument_bags,
            bag,
            self.instrument_generators.len() + 1,
        )?;
        Ok(&self.instrument_generators[range])
    }
}

/// Resolve `starts[row]..starts[row + 1]`, checking that `row` has a
/// successor and that the span is ascending and ends before `target_len`.
///
/// Callers pass one more than the target table length when the span may
/// legitimately reach the end of the table (generator lists have no
/// sentinel of their own that the last bag must point below).
fn span(table: &'static str, starts: &[u16], row: usize, target_len: usize) -> Result<Range<usize>> {
    if row + 1 >= starts.len() {
        return Err(Error::bad_reference(table, row, starts.len().saturating_sub(1)));
    }
    let from = usize::from(starts[row]);
    let to = usize::from(starts[row + 1]);
    if from > to {
        return Err(Error::MalformedContainer(format!(
            "{} row {} spans descending range {}..{}",
            table, row, from, to
        )));
    }
    if to >= target_len {
        return Err(Error::bad_reference(table, to, target_len));
    }
    Ok(from..to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_major() {
        assert_eq!(FormatVersion::from_major(0), None);
        assert_eq!(FormatVersion::from_major(1), Some(FormatVersion::V1));
        assert_eq!(FormatVersion::from_major(2), Some(FormatVersion::V2));
        assert_eq!(FormatVersion::from_major(3), Some(FormatVersion::V2));
        assert_eq!(FormatVersion::V1.sample_row_size(), 16);
        assert_eq!(FormatVersion::V2.sample_row_size(), 46);
    }

    #[test]
    fn test_span_uses_successor_row() {
        assert_eq!(span("pbag", &[0, 2, 5], 1, 6).unwrap(), 2..5);
        assert_eq!(span("pbag", &[0, 2, 5], 0, 6).unwrap(), 0..2);
    }

    #[test]
    fn test_span_rejects_missing_sentinel() {
        assert!(matches!(
            span("phdr", &[0, 2], 1, 10),
            Err(Error::BadReference { table: "phdr", .. })
        ));
    }

    #[test]
    fn test_span_rejects_descending_and_overrun() {
        assert!(matches!(
            span("ibag", &[4, 2], 0, 10),
            Err(Error::MalformedContainer(_))
        ));
        assert!(matches!(
            span("ibag", &[0, 12], 0, 10),
            Err(Error::BadReference { index: 12, .. })
        ));
    }
}
