//! Error types for bank loading and voice compilation.

use sfbank_dsp::DspError;
use thiserror::Error;

/// Result type alias for sfbank operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a bank or preparing its voices.
///
/// Container-level problems (bad magic, truncated chunks, missing tables)
/// abort the whole load. Problems confined to one voice are logged and the
/// voice is skipped instead, so they never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying file or stream error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream does not start with a `RIFF`/`sfbk` header.
    #[error("Not a SoundFont bank: {0}")]
    NotASoundFont(String),

    /// The chunk structure is inconsistent.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// A chunk declares more payload than the stream holds.
    #[error("Truncated chunk '{tag}' at offset {offset}: declared {declared} bytes, {available} available")]
    Truncated {
        tag: String,
        offset: u64,
        declared: u64,
        available: u64,
    },

    /// The `ifil` major version is missing, zero, or otherwise unusable.
    #[error("Unsupported bank version {0}")]
    UnsupportedVersion(u16),

    /// A table the voice builder depends on is absent.
    #[error("Missing required chunk '{0}'")]
    MissingChunk(&'static str),

    /// A header, bag or generator points outside its target table.
    #[error("Bad reference in {table}: index {index} outside 0..{len}")]
    BadReference {
        table: &'static str,
        index: usize,
        len: usize,
    },

    /// Sample data could not be reshaped.
    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn bad_reference(table: &'static str, index: usize, len: usize) -> Self {
        Error::BadReference { table, index, len }
    }
}
