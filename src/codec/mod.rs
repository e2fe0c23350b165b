//! Score codecs: fixed-width byte cells for floating-point scores.
//!
//! Two interchangeable strategies exist. The quantized codec rounds
//! scores in a bounded range to a fixed decimal precision (lossy, very
//! compact); the dictionary codec interns exact values (lossless). Both
//! serialize their full configuration into the index stream so a reader
//! self-configures with no out-of-band knowledge.
//!
//! Cell widths are constant per file. The all-ones code (`0xFF` in every
//! byte) is reserved as the NaN sentinel in both codecs, which makes the
//! writer's `0xFF`-filled block buffers decode to NaN wherever no score
//! was ever written.

mod dictionary;
mod quantized;

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};
pub use dictionary::{DictionaryBuilder, DictionaryCodec};
pub use quantized::QuantizedCodec;
use serde_json::{Map, Value};

use crate::error::{CodecError, Result};
use crate::utils::{read_string, write_string};

const TAG_QUANTIZED: u8 = 1;
const TAG_DICTIONARY: u8 = 2;

/// Largest code representable in `width` bytes; reserved as the NaN
/// sentinel by both codecs.
pub(crate) fn sentinel_for(width: usize) -> u64 {
    if width == 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

/// Smallest byte width whose code space fits `code_count` codes plus the
/// reserved sentinel.
pub(crate) fn width_for_codes(code_count: u64) -> Option<usize> {
    (1..=8).find(|&n| code_count <= sentinel_for(n))
}

/// Writes a code into a little-endian fixed-width cell
pub(crate) fn put_code(code: u64, cell: &mut [u8]) {
    for (i, byte) in cell.iter_mut().enumerate() {
        *byte = (code >> (8 * i)) as u8;
    }
}

/// Reads a code from a little-endian fixed-width cell
pub(crate) fn get_code(cell: &[u8]) -> u64 {
    cell.iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}

/// The score codec chosen for a file, dispatching between the two
/// strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreCodec {
    Quantized(QuantizedCodec),
    Dictionary(DictionaryCodec),
}

impl ScoreCodec {
    /// Fixed width in bytes of every encoded cell in the file
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Quantized(codec) => codec.width(),
            Self::Dictionary(codec) => codec.width(),
        }
    }

    /// Encodes a score into a cell of exactly [`ScoreCodec::width`] bytes
    pub fn encode(&self, score: f64, cell: &mut [u8]) -> Result<()> {
        match self {
            Self::Quantized(codec) => codec.encode(score, cell),
            Self::Dictionary(codec) => codec.encode(score, cell),
        }
    }

    /// Decodes a cell of exactly [`ScoreCodec::width`] bytes
    pub fn decode(&self, cell: &[u8]) -> Result<f64> {
        match self {
            Self::Quantized(codec) => codec.decode(cell),
            Self::Dictionary(codec) => codec.decode(cell),
        }
    }

    pub(crate) fn write_config<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Self::Quantized(codec) => {
                writer.write_u8(TAG_QUANTIZED)?;
                codec.write_config(writer)
            }
            Self::Dictionary(codec) => {
                writer.write_u8(TAG_DICTIONARY)?;
                codec.write_config(writer)
            }
        }
    }

    pub(crate) fn read_config<R: Read>(reader: &mut R) -> Result<Self> {
        match reader.read_u8()? {
            TAG_QUANTIZED => Ok(Self::Quantized(QuantizedCodec::read_config(reader)?)),
            TAG_DICTIONARY => Ok(Self::Dictionary(DictionaryCodec::read_config(reader)?)),
            other => Err(CodecError::UnknownCodecTag(other).into()),
        }
    }
}

impl From<QuantizedCodec> for ScoreCodec {
    fn from(codec: QuantizedCodec) -> Self {
        Self::Quantized(codec)
    }
}

impl From<DictionaryCodec> for ScoreCodec {
    fn from(codec: DictionaryCodec) -> Self {
        Self::Dictionary(codec)
    }
}

/// Renders the companion JSON fragment for a score under a fixed
/// key/sub-key pair, e.g. `{"phyloP":{"score":0.42}}`.
///
/// The fragment is a text-side convenience only; binary lookups never
/// consult it. NaN renders as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreJsonEncoder {
    key: String,
    sub_key: String,
}

impl ScoreJsonEncoder {
    #[must_use]
    pub fn new(key: &str, sub_key: &str) -> Self {
        Self {
            key: key.to_string(),
            sub_key: sub_key.to_string(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn sub_key(&self) -> &str {
        &self.sub_key
    }

    #[must_use]
    pub fn render(&self, score: f64) -> String {
        let mut inner = Map::new();
        inner.insert(self.sub_key.clone(), Value::from(score));
        let mut outer = Map::new();
        outer.insert(self.key.clone(), Value::Object(inner));
        Value::Object(outer).to_string()
    }

    pub(crate) fn write_config<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.key)?;
        write_string(writer, &self.sub_key)?;
        Ok(())
    }

    pub(crate) fn read_config<R: Read>(reader: &mut R) -> Result<Self> {
        let key = read_string(reader)?;
        let sub_key = read_string(reader)?;
        Ok(Self { key, sub_key })
    }
}
