//! Construction-time configuration for writers and readers.
//!
//! A writer is configured once per session; the subset of its settings a
//! reader needs to self-configure (codec, json keys, alphabet, block
//! length) is serialized into the index stream in that order.

use std::collections::HashMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::{ScoreCodec, ScoreJsonEncoder};
use crate::error::{Result, WriteError};
use crate::utils::{read_string, write_string};
use crate::validate::RecordValidator;

/// Full write-session configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct WriterSettings {
    block_length: u32,
    nucleotides: Vec<String>,
    positional: bool,
    codec: ScoreCodec,
    json_encoder: ScoreJsonEncoder,
    validator: RecordValidator,
}

impl WriterSettings {
    pub fn new(
        block_length: u32,
        nucleotides: &[&str],
        codec: ScoreCodec,
        json_encoder: ScoreJsonEncoder,
        validator: RecordValidator,
    ) -> Result<Self> {
        if block_length == 0 {
            return Err(WriteError::InvalidBlockLength(block_length).into());
        }
        if nucleotides.is_empty() {
            return Err(WriteError::EmptyAlphabet.into());
        }
        let mut seen = Vec::with_capacity(nucleotides.len());
        for &symbol in nucleotides {
            if seen.contains(&symbol) {
                return Err(WriteError::DuplicateSymbol(symbol.to_string()).into());
            }
            seen.push(symbol);
        }
        Ok(Self {
            block_length,
            nucleotides: nucleotides.iter().map(|s| (*s).to_string()).collect(),
            positional: false,
            codec,
            json_encoder,
            validator,
        })
    }

    /// Stamps the file pair with the legacy positional-annotation
    /// identity instead of the score identity.
    #[must_use]
    pub fn positional(mut self, positional: bool) -> Self {
        self.positional = positional;
        self
    }

    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    #[must_use]
    pub fn validator(&self) -> &RecordValidator {
        &self.validator
    }

    /// Derives the reader-facing subset of these settings
    #[must_use]
    pub fn reader_settings(&self) -> ReaderSettings {
        ReaderSettings::new(
            self.codec.clone(),
            self.json_encoder.clone(),
            self.nucleotides.clone(),
            self.block_length,
        )
    }
}

/// The self-describing subset of settings a reader reconstructs from the
/// index stream.
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    codec: ScoreCodec,
    json_encoder: ScoreJsonEncoder,
    nucleotides: Vec<String>,
    block_length: u32,
    slot_offsets: HashMap<String, usize>,
}

impl ReaderSettings {
    #[must_use]
    pub fn new(
        codec: ScoreCodec,
        json_encoder: ScoreJsonEncoder,
        nucleotides: Vec<String>,
        block_length: u32,
    ) -> Self {
        let width = codec.width();
        let slot_offsets = nucleotides
            .iter()
            .enumerate()
            .map(|(slot, symbol)| (symbol.clone(), slot * width))
            .collect();
        Self {
            codec,
            json_encoder,
            nucleotides,
            block_length,
            slot_offsets,
        }
    }

    #[must_use]
    pub fn codec(&self) -> &ScoreCodec {
        &self.codec
    }

    #[must_use]
    pub fn json_encoder(&self) -> &ScoreJsonEncoder {
        &self.json_encoder
    }

    #[must_use]
    pub fn nucleotides(&self) -> &[String] {
        &self.nucleotides
    }

    #[must_use]
    pub fn block_length(&self) -> u32 {
        self.block_length
    }

    /// Width in bytes of one encoded cell
    #[must_use]
    pub fn width(&self) -> usize {
        self.codec.width()
    }

    /// Bytes holding the cells of all alleles at one position
    #[must_use]
    pub fn position_width(&self) -> usize {
        self.nucleotides.len() * self.width()
    }

    /// Bytes in one full block
    #[must_use]
    pub fn block_bytes(&self) -> u64 {
        u64::from(self.block_length) * self.position_width() as u64
    }

    /// Byte offset of an allele's cell within its position group, or
    /// `None` for symbols outside the alphabet
    #[must_use]
    pub fn slot_offset(&self, allele: &str) -> Option<usize> {
        self.slot_offsets.get(allele).copied()
    }

    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.codec.write_config(writer)?;
        self.json_encoder.write_config(writer)?;
        writer.write_u8(self.nucleotides.len() as u8)?;
        for symbol in &self.nucleotides {
            write_string(writer, symbol)?;
        }
        writer.write_u32::<LittleEndian>(self.block_length)?;
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let codec = ScoreCodec::read_config(reader)?;
        let json_encoder = ScoreJsonEncoder::read_config(reader)?;
        let count = reader.read_u8()?;
        let mut nucleotides = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            nucleotides.push(read_string(reader)?);
        }
        let block_length = reader.read_u32::<LittleEndian>()?;
        Ok(Self::new(codec, json_encoder, nucleotides, block_length))
    }
}

#[cfg(test)]
mod testing {
    use std::io::Cursor;

    use super::*;
    use crate::codec::QuantizedCodec;
    use crate::error::Error;

    fn sample_writer_settings() -> Result<WriterSettings> {
        WriterSettings::new(
            10_000,
            &["A", "C", "G", "T"],
            QuantizedCodec::new(2, 1.0)?.into(),
            ScoreJsonEncoder::new("TestKey", "TestSubKey"),
            RecordValidator::default(),
        )
    }

    #[test]
    fn test_slot_offsets() -> Result<()> {
        let settings = sample_writer_settings()?.reader_settings();
        assert_eq!(settings.slot_offset("A"), Some(0));
        assert_eq!(settings.slot_offset("C"), Some(1));
        assert_eq!(settings.slot_offset("G"), Some(2));
        assert_eq!(settings.slot_offset("T"), Some(3));
        assert_eq!(settings.slot_offset("K"), None);
        Ok(())
    }

    #[test]
    fn test_slot_offsets_scale_with_width() -> Result<()> {
        // 3-digit precision over [0, 1] needs two bytes per cell.
        let settings = ReaderSettings::new(
            QuantizedCodec::new(3, 1.0)?.into(),
            ScoreJsonEncoder::new("k", "s"),
            vec!["A".into(), "C".into(), "G".into(), "T".into()],
            25,
        );
        assert_eq!(settings.width(), 2);
        assert_eq!(settings.slot_offset("G"), Some(4));
        assert_eq!(settings.position_width(), 8);
        assert_eq!(settings.block_bytes(), 200);
        Ok(())
    }

    #[test]
    fn test_settings_roundtrip() -> Result<()> {
        let settings = sample_writer_settings()?.reader_settings();
        let mut buf = Vec::new();
        settings.write_to(&mut buf)?;

        let read = ReaderSettings::read_from(&mut Cursor::new(buf))?;
        assert_eq!(read.block_length(), 10_000);
        assert_eq!(read.nucleotides(), settings.nucleotides());
        assert_eq!(read.json_encoder(), settings.json_encoder());
        assert_eq!(read.width(), 1);
        assert_eq!(read.slot_offset("T"), Some(3));
        Ok(())
    }

    #[test]
    fn test_invalid_configurations() -> Result<()> {
        let codec: ScoreCodec = QuantizedCodec::new(2, 1.0)?.into();
        let json = ScoreJsonEncoder::new("k", "s");

        let err = WriterSettings::new(0, &["A"], codec.clone(), json.clone(), RecordValidator::default())
            .unwrap_err();
        assert!(matches!(err, Error::Write(WriteError::InvalidBlockLength(0))));

        let err = WriterSettings::new(10, &[], codec.clone(), json.clone(), RecordValidator::default())
            .unwrap_err();
        assert!(matches!(err, Error::Write(WriteError::EmptyAlphabet)));

        let err = WriterSettings::new(10, &["A", "C", "A"], codec, json, RecordValidator::default())
            .unwrap_err();
        assert!(matches!(err, Error::Write(WriteError::DuplicateSymbol(_))));
        Ok(())
    }
}
