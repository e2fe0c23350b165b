use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{get_code, put_code, sentinel_for, width_for_codes};
use crate::error::{CodecError, Result};

/// Quantization is only exact while scaled scores stay inside the f64
/// integer range.
const MAX_SCALED: f64 = (1u64 << f64::MANTISSA_DIGITS) as f64;

/// Lossy codec for scores in `[0, max_score]`, rounded to a fixed number
/// of decimal digits.
///
/// A score is scaled by `10^digits`, rounded to the nearest integer, and
/// stored in the minimum number of bytes that can hold the scaled range
/// plus the reserved all-ones NaN sentinel. Round trips are accurate to
/// `0.5 * 10^-digits`; NaN round-trips exactly. Scores outside the range
/// are a reported error, never clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedCodec {
    digits: u8,
    max_score: f64,
    scale: f64,
    max_code: u64,
    width: usize,
    sentinel: u64,
}

impl QuantizedCodec {
    /// Creates a codec for `digits` decimal digits over `[0, max_score]`.
    ///
    /// Fails when the scaled range cannot be represented exactly in a
    /// fixed-width cell.
    pub fn new(digits: u8, max_score: f64) -> Result<Self> {
        let scale = 10f64.powi(i32::from(digits));
        let scaled = (max_score * scale).round();
        if !max_score.is_finite() || max_score <= 0.0 || scaled >= MAX_SCALED {
            return Err(CodecError::UnsupportedPrecision { digits, max_score }.into());
        }
        let max_code = scaled as u64;
        let width = width_for_codes(max_code + 1)
            .ok_or(CodecError::UnsupportedPrecision { digits, max_score })?;
        Ok(Self {
            digits,
            max_score,
            scale,
            max_code,
            width,
            sentinel: sentinel_for(width),
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn digits(&self) -> u8 {
        self.digits
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Encodes a score into `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not exactly [`QuantizedCodec::width`] bytes.
    pub fn encode(&self, score: f64, cell: &mut [u8]) -> Result<()> {
        assert_eq!(cell.len(), self.width);
        if score.is_nan() {
            put_code(self.sentinel, cell);
            return Ok(());
        }
        if score < 0.0 || score > self.max_score {
            return Err(CodecError::ScoreOutOfRange {
                score,
                max_score: self.max_score,
            }
            .into());
        }
        put_code((score * self.scale).round() as u64, cell);
        Ok(())
    }

    /// Decodes a cell back into a score.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not exactly [`QuantizedCodec::width`] bytes.
    pub fn decode(&self, cell: &[u8]) -> Result<f64> {
        assert_eq!(cell.len(), self.width);
        let code = get_code(cell);
        if code == self.sentinel {
            return Ok(f64::NAN);
        }
        if code > self.max_code {
            return Err(CodecError::CodeOutOfRange {
                code,
                max_code: self.max_code,
            }
            .into());
        }
        Ok(code as f64 / self.scale)
    }

    pub(crate) fn write_config<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.digits)?;
        writer.write_f64::<LittleEndian>(self.max_score)?;
        Ok(())
    }

    pub(crate) fn read_config<R: Read>(reader: &mut R) -> Result<Self> {
        let digits = reader.read_u8()?;
        let max_score = reader.read_f64::<LittleEndian>()?;
        Self::new(digits, max_score)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_byte_width_boundaries() -> Result<()> {
        assert_eq!(QuantizedCodec::new(2, 1.0)?.width(), 1);
        assert_eq!(QuantizedCodec::new(3, 1.0)?.width(), 2);
        assert_eq!(QuantizedCodec::new(5, 1.0)?.width(), 3);
        Ok(())
    }

    #[test]
    fn test_byte_width_monotonicity() -> Result<()> {
        let mut previous = 0;
        for digits in 0..=9 {
            let width = QuantizedCodec::new(digits, 1.0)?.width();
            assert!(width >= previous);
            previous = width;
        }
        let mut previous = 0;
        for max_score in [0.5, 1.0, 10.0, 100.0, 1_000.0, 100_000.0] {
            let width = QuantizedCodec::new(3, max_score)?.width();
            assert!(width >= previous);
            previous = width;
        }
        Ok(())
    }

    #[test]
    fn test_roundtrip_within_tolerance() -> Result<()> {
        let codec = QuantizedCodec::new(2, 1.0)?;
        let tolerance = 0.5 * 10f64.powi(-2);
        let mut cell = [0u8; 1];
        for i in 0..=1_000 {
            let score = f64::from(i) / 1_000.0;
            codec.encode(score, &mut cell)?;
            let decoded = codec.decode(&cell)?;
            assert!((decoded - score).abs() <= tolerance, "score {score}");
        }
        Ok(())
    }

    #[test]
    fn test_range_endpoints() -> Result<()> {
        let codec = QuantizedCodec::new(2, 1.0)?;
        let mut cell = [0u8; 1];
        codec.encode(0.0, &mut cell)?;
        assert_eq!(codec.decode(&cell)?, 0.0);
        codec.encode(1.0, &mut cell)?;
        assert_eq!(codec.decode(&cell)?, 1.0);
        Ok(())
    }

    #[test]
    fn test_nan_roundtrips_exactly() -> Result<()> {
        let codec = QuantizedCodec::new(2, 1.0)?;
        let mut cell = [0u8; 1];
        codec.encode(f64::NAN, &mut cell)?;
        assert_eq!(cell, [0xFF]);
        assert!(codec.decode(&cell)?.is_nan());
        Ok(())
    }

    #[test]
    fn test_unwritten_cell_decodes_to_nan() -> Result<()> {
        // Block buffers are 0xFF-filled; an untouched cell must read as NaN.
        let codec = QuantizedCodec::new(5, 1.0)?;
        assert!(codec.decode(&[0xFF, 0xFF, 0xFF])?.is_nan());
        Ok(())
    }

    #[test]
    fn test_out_of_range_score_is_fatal() -> Result<()> {
        let codec = QuantizedCodec::new(2, 1.0)?;
        let mut cell = [0u8; 1];
        for score in [1.01, -0.01, f64::INFINITY, f64::NEG_INFINITY] {
            let err = codec.encode(score, &mut cell).unwrap_err();
            assert!(matches!(
                err,
                Error::Codec(CodecError::ScoreOutOfRange { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn test_corrupt_code_is_rejected() -> Result<()> {
        let codec = QuantizedCodec::new(2, 1.0)?;
        // Codes 101..=254 are outside the quantized range but not the sentinel.
        let err = codec.decode(&[200]).unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(CodecError::CodeOutOfRange { code: 200, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unrepresentable_precision() {
        assert!(QuantizedCodec::new(18, 100.0).is_err());
        assert!(QuantizedCodec::new(2, 0.0).is_err());
        assert!(QuantizedCodec::new(2, f64::NAN).is_err());
        assert!(QuantizedCodec::new(2, f64::INFINITY).is_err());
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let codec = QuantizedCodec::new(4, 50.0)?;
        let mut buf = Vec::new();
        codec.write_config(&mut buf)?;
        let read = QuantizedCodec::read_config(&mut std::io::Cursor::new(buf))?;
        assert_eq!(read, codec);
        Ok(())
    }
}
