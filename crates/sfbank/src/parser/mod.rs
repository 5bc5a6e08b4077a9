//! SoundFont container parsing.
//!
//! Turns a RIFF `sfbk` file into a [`Bank`]: header, bag, generator and
//! sample tables decoded but not yet interpreted.
//!
//! # Structure
//!
//! ```text
//! RIFF 'sfbk'
//!   LIST 'INFO'  ifil, INAM, ...
//!   LIST 'sdta'  snam (version 1), smpl
//!   LIST 'pdta'  phdr pbag pmod pgen inst ibag imod igen shdr
//! ```

pub mod chunk;
pub mod parse;
pub mod tables;
pub mod types;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

pub use chunk::{ChunkHeader, ChunkId, ChunkReader, FourCc};
pub use types::{
    Bank, FormatVersion, GeneratorRecord, InstrumentHeader, PresetHeader, SampleInfo, SampleType,
    VersionTag,
};

pub use crate::error::Result;

/// Parse a bank from any seekable stream.
pub fn parse_bank<R: Read + Seek>(reader: R) -> Result<Bank> {
    parse::parse_bank(reader)
}

/// Open and parse a bank file.
pub fn load_bank_file(path: impl AsRef<Path>) -> Result<Bank> {
    let file = File::open(path.as_ref())?;
    parse_bank(BufReader::new(file))
}
