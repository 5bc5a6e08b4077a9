//! Container walk.
//!
//! The walk collects raw table payloads first and decodes them once the
//! whole file has been seen, because the width of `shdr` rows depends on
//! the `ifil` version and nothing forces `INFO` to precede `pdta`.

use std::io::{Read, Seek};

use byteorder::{ByteOrder, LittleEndian};

use super::chunk::{ChunkHeader, ChunkId, ChunkReader};
use super::tables::{
    decode_bags, decode_generators, decode_instrument_headers, decode_name,
    decode_preset_headers, decode_sample_infos, decode_sample_names,
};
use super::types::{Bank, FormatVersion, VersionTag};
use crate::error::{Error, Result};

/// Payloads gathered during the walk.
#[derive(Debug, Default)]
struct RawTables {
    version: Option<VersionTag>,
    name: Option<String>,
    sample_names: Option<Vec<u8>>,
    sample_data: Option<(u64, u32)>,
    phdr: Option<Vec<u8>>,
    pbag: Option<Vec<u8>>,
    pgen: Option<Vec<u8>>,
    inst: Option<Vec<u8>>,
    ibag: Option<Vec<u8>>,
    igen: Option<Vec<u8>>,
    shdr: Option<Vec<u8>>,
}

/// Parse a SoundFont bank from a seekable stream.
///
/// The stream is left positioned somewhere inside the file; PCM data is
/// not read, only located.
pub fn parse_bank<R: Read + Seek>(reader: R) -> Result<Bank> {
    let mut chunks = ChunkReader::new(reader)?;
    let riff_end = chunks.read_riff_header()?;
    let mut raw = RawTables::default();

    while chunks.position()? < riff_end {
        let Some(header) = chunks.next_header()? else {
            break;
        };
        if header.id != ChunkId::List {
            log::debug!("Skipping top-level chunk '{}' ({} bytes)", header.tag, header.size);
            chunks.skip(&header)?;
            continue;
        }

        let list_type = chunks.read_list_type(&header)?;
        let list_end = header.end();
        match list_type.id() {
            ChunkId::Info => walk_list(&mut chunks, list_end, |chunks, child| {
                read_info_chunk(chunks, child, &mut raw)
            })?,
            ChunkId::Sdta => walk_list(&mut chunks, list_end, |chunks, child| {
                read_sample_data_chunk(chunks, child, &mut raw)
            })?,
            ChunkId::Pdta => walk_list(&mut chunks, list_end, |chunks, child| {
                read_preset_data_chunk(chunks, child, &mut raw)
            })?,
            _ => {
                log::debug!("Skipping LIST '{}'", list_type);
                chunks.seek_to(list_end)?;
            }
        }
    }

    raw.into_bank()
}

/// Visit the children of a list until its end, or until a nested `LIST`
/// header, which is left unread for the caller.
fn walk_list<R, F>(chunks: &mut ChunkReader<R>, list_end: u64, mut visit: F) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(&mut ChunkReader<R>, &ChunkHeader) -> Result<()>,
{
    while chunks.position()? < list_end {
        let Some(header) = chunks.next_header()? else {
            break;
        };
        if header.id == ChunkId::List {
            chunks.unread_header(&header)?;
            break;
        }
        visit(chunks, &header)?;
        chunks.skip(&header)?;
    }
    Ok(())
}

fn read_info_chunk<R: Read + Seek>(
    chunks: &mut ChunkReader<R>,
    header: &ChunkHeader,
    raw: &mut RawTables,
) -> Result<()> {
    match header.id {
        ChunkId::Ifil => {
            let payload = chunks.read_payload(header)?;
            if payload.len() < 4 {
                return Err(Error::MalformedContainer(format!(
                    "ifil carries {} bytes, expected 4",
                    payload.len()
                )));
            }
            let version = VersionTag {
                major: LittleEndian::read_u16(&payload[0..2]),
                minor: LittleEndian::read_u16(&payload[2..4]),
            };
            log::debug!("Bank version {}.{:02}", version.major, version.minor);
            raw.version = Some(version);
        }
        ChunkId::Inam => {
            let payload = chunks.read_payload(header)?;
            raw.name = Some(decode_name(&payload));
        }
        ChunkId::Isng | ChunkId::Irom | ChunkId::Iver | ChunkId::Iprd | ChunkId::Icop => {
            log::trace!("Ignoring INFO chunk '{}'", header.tag);
        }
        _ => log::debug!("Skipping unknown INFO chunk '{}'", header.tag),
    }
    Ok(())
}

fn read_sample_data_chunk<R: Read + Seek>(
    chunks: &mut ChunkReader<R>,
    header: &ChunkHeader,
    raw: &mut RawTables,
) -> Result<()> {
    match header.id {
        ChunkId::Snam => raw.sample_names = Some(chunks.read_payload(header)?),
        ChunkId::Smpl => {
            log::debug!("Sample data: {} bytes at offset {}", header.size, header.offset);
            raw.sample_data = Some((header.offset, header.size));
        }
        _ => log::debug!("Skipping unknown sdta chunk '{}'", header.tag),
    }
    Ok(())
}

fn read_preset_data_chunk<R: Read + Seek>(
    chunks: &mut ChunkReader<R>,
    header: &ChunkHeader,
    raw: &mut RawTables,
) -> Result<()> {
    let slot = match header.id {
        ChunkId::Phdr => &mut raw.phdr,
        ChunkId::Pbag => &mut raw.pbag,
        ChunkId::Pgen => &mut raw.pgen,
        ChunkId::Inst => &mut raw.inst,
        ChunkId::Ibag => &mut raw.ibag,
        ChunkId::Igen => &mut raw.igen,
        ChunkId::Shdr => &mut raw.shdr,
        ChunkId::Pmod | ChunkId::Imod => {
            log::trace!("Ignoring modulator table '{}'", header.tag);
            return Ok(());
        }
        _ => {
            log::debug!("Skipping unknown pdta chunk '{}'", header.tag);
            return Ok(());
        }
    };
    *slot = Some(chunks.read_payload(header)?);
    Ok(())
}

fn required(payload: Option<Vec<u8>>, tag: &'static str) -> Result<Vec<u8>> {
    payload.ok_or(Error::MissingChunk(tag))
}

impl RawTables {
    fn into_bank(self) -> Result<Bank> {
        let version = self.version.ok_or(Error::UnsupportedVersion(0))?;
        let format =
            FormatVersion::from_major(version.major).ok_or(Error::UnsupportedVersion(version.major))?;

        let (sample_data_offset, sample_data_len) = self.sample_data.ok_or(Error::MissingChunk("smpl"))?;

        let mut samples = decode_sample_infos(&required(self.shdr, "shdr")?, format)?;
        if format == FormatVersion::V1 {
            match self.sample_names {
                Some(payload) => {
                    for (sample, name) in samples.iter_mut().zip(decode_sample_names(&payload)) {
                        sample.name = name;
                    }
                }
                None => log::warn!("Version-1 bank has no snam table; samples stay unnamed"),
            }
        }

        let bank = Bank {
            version,
            format,
            name: self.name,
            presets: decode_preset_headers(&required(self.phdr, "phdr")?)?,
            preset_bags: decode_bags("pbag", &required(self.pbag, "pbag")?)?,
            preset_generators: decode_generators("pgen", &required(self.pgen, "pgen")?)?,
            instruments: decode_instrument_headers(&required(self.inst, "inst")?)?,
            instrument_bags: decode_bags("ibag", &required(self.ibag, "ibag")?)?,
            instrument_generators: decode_generators("igen", &required(self.igen, "igen")?)?,
            samples,
            sample_data_offset,
            sample_data_len,
        };

        log::debug!(
            "Parsed bank {:?}: {} presets, {} instruments, {} samples",
            bank.name.as_deref().unwrap_or("<unnamed>"),
            bank.preset_count(),
            bank.instrument_count(),
            bank.samples.len()
        );
        Ok(bank)
    }
}
