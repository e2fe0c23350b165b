use std::collections::HashMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{get_code, put_code, sentinel_for, width_for_codes};
use crate::error::{CodecError, Result};

/// Dictionary keys are exact bit patterns; every NaN collapses onto the
/// canonical one so the table holds at most a single NaN entry.
fn canonical_bits(score: f64) -> u64 {
    if score.is_nan() {
        f64::NAN.to_bits()
    } else {
        score.to_bits()
    }
}

/// Accumulation phase of the dictionary codec.
///
/// All score values of a write session must be added before the table can
/// be frozen: the cell width is a function of the final cardinality.
/// Freezing consumes the builder, so encoding against a half-built table
/// is unrepresentable.
#[derive(Debug, Clone, Default)]
pub struct DictionaryBuilder {
    values: Vec<f64>,
    codes: HashMap<u64, u64>,
}

impl DictionaryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one value; duplicates (by exact bit pattern) collapse onto
    /// their first appearance.
    pub fn add(&mut self, score: f64) {
        let key = canonical_bits(score);
        if !self.codes.contains_key(&key) {
            self.codes.insert(key, self.values.len() as u64);
            self.values.push(f64::from_bits(key));
        }
    }

    /// Number of distinct values accumulated so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Finalizes the table and derives the cell width from its
    /// cardinality. After this point the code assignment is immutable.
    #[must_use]
    pub fn freeze(self) -> DictionaryCodec {
        let width = width_for_codes(self.values.len() as u64).unwrap_or(8);
        DictionaryCodec {
            values: self.values,
            codes: self.codes,
            width,
            sentinel: sentinel_for(width),
        }
    }
}

impl Extend<f64> for DictionaryBuilder {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for score in iter {
            self.add(score);
        }
    }
}

impl FromIterator<f64> for DictionaryBuilder {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut builder = Self::new();
        builder.extend(iter);
        builder
    }
}

/// Lossless codec over a frozen table of distinct values, in order of
/// first appearance.
///
/// Every value added during accumulation round-trips bit-for-bit,
/// including negative values, `-0.0`, and NaN. The all-ones code is
/// reserved for cells that were never written and decodes to NaN.
#[derive(Debug, Clone)]
pub struct DictionaryCodec {
    values: Vec<f64>,
    codes: HashMap<u64, u64>,
    width: usize,
    sentinel: u64,
}

impl DictionaryCodec {
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of distinct values in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encodes a score into `cell`; the value must have been added during
    /// accumulation.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not exactly [`DictionaryCodec::width`] bytes.
    pub fn encode(&self, score: f64, cell: &mut [u8]) -> Result<()> {
        assert_eq!(cell.len(), self.width);
        let code = self
            .codes
            .get(&canonical_bits(score))
            .ok_or(CodecError::UnknownScore(score))?;
        put_code(*code, cell);
        Ok(())
    }

    /// Decodes a cell by exact table lookup.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not exactly [`DictionaryCodec::width`] bytes.
    pub fn decode(&self, cell: &[u8]) -> Result<f64> {
        assert_eq!(cell.len(), self.width);
        let code = get_code(cell);
        if code == self.sentinel {
            return Ok(f64::NAN);
        }
        self.values
            .get(code as usize)
            .copied()
            .ok_or_else(|| {
                CodecError::UnknownCode {
                    code,
                    table_size: self.values.len(),
                }
                .into()
            })
    }

    pub(crate) fn write_config<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.values.len() as u64)?;
        for value in &self.values {
            writer.write_u64::<LittleEndian>(value.to_bits())?;
        }
        Ok(())
    }

    pub(crate) fn read_config<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u64::<LittleEndian>()?;
        let mut builder = DictionaryBuilder::new();
        for _ in 0..count {
            builder.add(f64::from_bits(reader.read_u64::<LittleEndian>()?));
        }
        Ok(builder.freeze())
    }
}

impl PartialEq for DictionaryCodec {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
