//! RIFF chunk framing.
//!
//! Every chunk is a four-character tag, a little-endian `u32` payload
//! length and the payload itself. `RIFF` and `LIST` payloads start with a
//! second tag naming the form or list type.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Size of a chunk header on disk.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// A raw four-character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// The chunk kind this tag names.
    pub fn id(self) -> ChunkId {
        ChunkId::from_tag(self)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{}\")", self)
    }
}

/// Chunk kinds the parser understands. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkId {
    Riff,
    List,
    Sfbk,
    Info,
    Sdta,
    Pdta,
    Ifil,
    Isng,
    Irom,
    Iver,
    Inam,
    Iprd,
    Icop,
    Snam,
    Smpl,
    Phdr,
    Pbag,
    Pmod,
    Pgen,
    Inst,
    Ibag,
    Imod,
    Igen,
    Shdr,
    Unknown,
}

impl ChunkId {
    pub fn from_tag(tag: FourCc) -> Self {
        match &tag.0 {
            b"RIFF" => ChunkId::Riff,
            b"LIST" => ChunkId::List,
            b"sfbk" => ChunkId::Sfbk,
            b"INFO" => ChunkId::Info,
            b"sdta" => ChunkId::Sdta,
            b"pdta" => ChunkId::Pdta,
            b"ifil" => ChunkId::Ifil,
            b"isng" => ChunkId::Isng,
            b"irom" => ChunkId::Irom,
            b"iver" => ChunkId::Iver,
            b"INAM" => ChunkId::Inam,
            b"IPRD" => ChunkId::Iprd,
            b"ICOP" => ChunkId::Icop,
            b"snam" => ChunkId::Snam,
            b"smpl" => ChunkId::Smpl,
            b"phdr" => ChunkId::Phdr,
            b"pbag" => ChunkId::Pbag,
            b"pmod" => ChunkId::Pmod,
            b"pgen" => ChunkId::Pgen,
            b"inst" => ChunkId::Inst,
            b"ibag" => ChunkId::Ibag,
            b"imod" => ChunkId::Imod,
            b"igen" => ChunkId::Igen,
            b"shdr" => ChunkId::Shdr,
            _ => ChunkId::Unknown,
        }
    }
}

/// A chunk header and where its payload lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: FourCc,
    pub id: ChunkId,
    /// Declared payload length in bytes
    pub size: u32,
    /// Absolute offset of the first payload byte
    pub offset: u64,
}

impl ChunkHeader {
    /// Absolute offset one past the payload.
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }
}

/// Sequential chunk reader over a seekable stream.
///
/// Every header is checked against the stream length before it is handed
/// out, so a chunk that claims more bytes than exist fails with
/// [`Error::Truncated`] instead of producing a short read later.
pub struct ChunkReader<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> ChunkReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let here = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(here))?;
        Ok(Self { inner, len })
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read_tag(&mut self) -> Result<FourCc> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag)?;
        Ok(FourCc(tag))
    }

    /// Read the `RIFF` header and `sfbk` form type. Returns the offset one
    /// past the RIFF payload.
    pub fn read_riff_header(&mut self) -> Result<u64> {
        if self.len < CHUNK_HEADER_SIZE + 4 {
            return Err(Error::NotASoundFont(format!(
                "stream is only {} bytes long",
                self.len
            )));
        }
        let tag = self.read_tag()?;
        if tag.id() != ChunkId::Riff {
            return Err(Error::NotASoundFont(format!("expected RIFF, found '{}'", tag)));
        }
        let size = self.inner.read_u32::<LittleEndian>()?;
        let form = self.read_tag()?;
        if form.id() != ChunkId::Sfbk {
            return Err(Error::NotASoundFont(format!("expected sfbk form, found '{}'", form)));
        }
        let end = CHUNK_HEADER_SIZE + u64::from(size);
        if end > self.len {
            return Err(Error::Truncated {
                tag: tag.to_string(),
                offset: CHUNK_HEADER_SIZE,
                declared: u64::from(size),
                available: self.len - CHUNK_HEADER_SIZE,
            });
        }
        Ok(end)
    }

    /// Read the next chunk header. Returns `None` at the end of the stream.
    pub fn next_header(&mut self) -> Result<Option<ChunkHeader>> {
        let start = self.position()?;
        if start >= self.len {
            return Ok(None);
        }
        if self.len - start < CHUNK_HEADER_SIZE {
            return Err(Error::Truncated {
                tag: "<header>".to_string(),
                offset: start,
                declared: CHUNK_HEADER_SIZE,
                available: self.len - start,
            });
        }
        let tag = self.read_tag()?;
        let size = self.inner.read_u32::<LittleEndian>()?;
        let header = ChunkHeader {
            tag,
            id: tag.id(),
            size,
            offset: start + CHUNK_HEADER_SIZE,
        };
        if header.end() > self.len {
            return Err(Error::Truncated {
                tag: tag.to_string(),
                offset: header.offset,
                declared: u64::from(size),
                available: self.len - header.offset,
            });
        }
        Ok(Some(header))
    }

    /// Step back over a header just returned by [`Self::next_header`].
    pub fn unread_header(&mut self, header: &ChunkHeader) -> Result<()> {
        self.seek_to(header.offset - CHUNK_HEADER_SIZE)
    }

    /// Read the list type that opens a `LIST` payload.
    pub fn read_list_type(&mut self, header: &ChunkHeader) -> Result<FourCc> {
        if header.size < 4 {
            return Err(Error::MalformedContainer(format!(
                "LIST at offset {} is too short to carry a list type",
                header.offset
            )));
        }
        self.seek_to(header.offset)?;
        self.read_tag()
    }

    /// Read a whole chunk payload.
    pub fn read_payload(&mut self, header: &ChunkHeader) -> Result<Vec<u8>> {
        self.seek_to(header.offset)?;
        let mut payload = vec![0u8; header.size as usize];
        self.inner.read_exact(&mut payload)?;
        Ok(payload)
    }

    /// Move past a chunk without reading it.
    pub fn skip(&mut self, header: &ChunkHeader) -> Result<()> {
        self.seek_to(header.end())
    }
}
