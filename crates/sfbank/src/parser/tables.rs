//! Fixed-width table row decoders.
//!
//! Every `pdta` table is a flat array of little-endian rows. The row count
//! is `payload.len() / row_size`; trailing bytes that do not fill a row are
//! ignored.

use nom::{
    bytes::complete::take,
    number::complete::{le_i16, le_i32, le_i8, le_u16, le_u8},
    IResult,
};

use super::types::{
    FormatVersion, GeneratorRecord, InstrumentHeader, PresetHeader, SampleInfo, SampleType,
};
use crate::error::{Error, Result};

/// Width of a name field.
pub const NAME_SIZE: usize = 20;
pub const PRESET_HEADER_SIZE: usize = 38;
pub const INSTRUMENT_HEADER_SIZE: usize = 22;
pub const BAG_SIZE: usize = 4;
pub const GENERATOR_SIZE: usize = 4;

/// Sample rate assumed for version-1 banks, which carry none.
pub const V1_SAMPLE_RATE: i32 = 44_100;
/// Root note assumed for version-1 banks.
pub const V1_ORIGINAL_PITCH: u8 = 60;

/// Decode a NUL-terminated name field, dropping trailing padding.
pub fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim_end().to_string()
}

fn name(input: &[u8]) -> IResult<&[u8], String> {
    let (input, raw) = take(NAME_SIZE)(input)?;
    Ok((input, decode_name(raw)))
}

fn preset_header(input: &[u8]) -> IResult<&[u8], PresetHeader> {
    let (input, name) = name(input)?;
    let (input, program) = le_u16(input)?;
    let (input, bank) = le_u16(input)?;
    let (input, bag_index) = le_u16(input)?;
    // library, genre, morphology
    let (input, _) = take(12usize)(input)?;
    Ok((
        input,
        PresetHeader {
            name,
            program,
            bank,
            bag_index,
        },
    ))
}

fn instrument_header(input: &[u8]) -> IResult<&[u8], InstrumentHeader> {
    let (input, name) = name(input)?;
    let (input, bag_index) = le_u16(input)?;
    Ok((input, InstrumentHeader { name, bag_index }))
}

fn bag(input: &[u8]) -> IResult<&[u8], u16> {
    let (input, generator_index) = le_u16(input)?;
    let (input, _modulator_index) = le_u16(input)?;
    Ok((input, generator_index))
}

fn generator(input: &[u8]) -> IResult<&[u8], GeneratorRecord> {
    let (input, operator) = le_i16(input)?;
    let (input, amount) = le_i16(input)?;
    Ok((input, GeneratorRecord { operator, amount }))
}

fn sample_v1(input: &[u8]) -> IResult<&[u8], SampleInfo> {
    let (input, start) = le_i32(input)?;
    let (input, end) = le_i32(input)?;
    let (input, loop_start) = le_i32(input)?;
    let (input, loop_end) = le_i32(input)?;
    Ok((
        input,
        SampleInfo {
            name: String::new(),
            start,
            end,
            loop_start,
            loop_end,
            sample_rate: V1_SAMPLE_RATE,
            original_pitch: V1_ORIGINAL_PITCH,
            pitch_correction: 0,
            sample_link: 0,
            sample_type: SampleType::MONO,
        },
    ))
}

fn sample_v2(input: &[u8]) -> IResult<&[u8], SampleInfo> {
    let (input, name) = name(input)?;
    let (input, start) = le_i32(input)?;
    let (input, end) = le_i32(input)?;
    let (input, loop_start) = le_i32(input)?;
    let (input, loop_end) = le_i32(input)?;
    let (input, sample_rate) = le_i32(input)?;
    let (input, original_pitch) = le_u8(input)?;
    let (input, pitch_correction) = le_i8(input)?;
    let (input, sample_link) = le_u16(input)?;
    let (input, sample_type) = le_u16(input)?;
    Ok((
        input,
        SampleInfo {
            name,
            start,
            end,
            loop_start,
            loop_end,
            sample_rate,
            original_pitch,
            pitch_correction,
            sample_link,
            sample_type: SampleType::from_bits_retain(sample_type),
        },
    ))
}

/// Decode every whole row of `payload`.
fn rows<'a, T>(
    table: &str,
    payload: &'a [u8],
    row_size: usize,
    mut row: impl FnMut(&'a [u8]) -> IResult<&'a [u8], T>,
) -> Result<Vec<T>> {
    let remainder = payload.len() % row_size;
    if remainder != 0 {
        log::debug!(
            "{}: ignoring {} trailing bytes after {} rows",
            table,
            remainder,
            payload.len() / row_size
        );
    }
    payload
        .chunks_exact(row_size)
        .map(|chunk| {
            row(chunk)
                .map(|(_, value)| value)
                .map_err(|e| Error::MalformedContainer(format!("{} row: {}", table, e)))
        })
        .collect()
}

pub fn decode_preset_headers(payload: &[u8]) -> Result<Vec<PresetHeader>> {
    rows("phdr", payload, PRESET_HEADER_SIZE, preset_header)
}

pub fn decode_instrument_headers(payload: &[u8]) -> Result<Vec<InstrumentHeader>> {
    rows("inst", payload, INSTRUMENT_HEADER_SIZE, instrument_header)
}

pub fn decode_bags(table: &str, payload: &[u8]) -> Result<Vec<u16>> {
    rows(table, payload, BAG_SIZE, bag)
}

pub fn decode_generators(table: &str, payload: &[u8]) -> Result<Vec<GeneratorRecord>> {
    rows(table, payload, GENERATOR_SIZE, generator)
}

/// Decode the `snam` table of a version-1 bank.
pub fn decode_sample_names(payload: &[u8]) -> Vec<String> {
    payload.chunks_exact(NAME_SIZE).map(decode_name).collect()
}

/// Decode the `shdr` table with the row layout of `format`.
///
/// Version-1 rows carry no sample type. Samples are laid out with the ROM
/// samples first, so every row before the first one starting at frame 0 is
/// marked as ROM data.
pub fn decode_sample_infos(payload: &[u8], format: FormatVersion) -> Result<Vec<SampleInfo>> {
    match format {
        FormatVersion::V2 => rows("shdr", payload, format.sample_row_size(), sample_v2),
        FormatVersion::V1 => {
            let mut samples = rows("shdr", payload, format.sample_row_size(), sample_v1)?;
            let mut in_rom = true;
            for (row, sample) in samples.iter_mut().enumerate() {
                // version-1 loop points are stored one and two frames short
                sample.loop_start = v1_loop_point(row, sample.loop_start, 1)?;
                sample.loop_end = v1_loop_point(row, sample.loop_end, 2)?;
                if sample.start == 0 {
                    in_rom = false;
                }
                if in_rom {
                    sample.sample_type = SampleType::ROM | SampleType::MONO;
                }
            }
            Ok(samples)
        }
    }
}

fn v1_loop_point(row: usize, stored: i32, shortfall: i32) -> Result<i32> {
    stored.checked_add(shortfall).ok_or_else(|| {
        Error::MalformedContainer(format!("shdr row {}: loop point {} out of range", row, stored))
    })
}
