//! File headers, kind tags, and provenance stamps.
//!
//! Both streams of a file pair open with the same fixed 16-byte preamble:
//! magic, kind tag, format version, file-pair id, and a guard literal.
//! The kind tag separates score files from the sibling positional
//! annotation format that shares this header layout; the two are never
//! cross-readable.

use std::io::{Read, Write};

use bytemuck::{Pod, Zeroable};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{HeaderError, Result};
use crate::utils::{read_string, write_string};
use crate::{FILE_MAGIC, FORMAT_VERSION, GUARD};

/// Size of the fixed file header in bytes
pub const SIZE_HEADER: usize = std::mem::size_of::<FileHeader>();

/// Role tag carried in every file header.
///
/// `ScoreData`/`ScoreIndex` identify the two halves of a score file pair.
/// `PositionalData`/`PositionalIndex` belong to the legacy positional
/// annotation format, which shares this header shape but nothing else;
/// a score reader rejects them wholesale.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    ScoreData = 1,
    ScoreIndex = 2,
    PositionalData = 3,
    PositionalIndex = 4,
}

impl FileKind {
    pub(crate) fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::ScoreData),
            2 => Ok(Self::ScoreIndex),
            3 => Ok(Self::PositionalData),
            4 => Ok(Self::PositionalIndex),
            other => Err(HeaderError::UnknownFileKind(other).into()),
        }
    }

    /// The data-stream kind for the chosen writer identity
    #[must_use]
    pub fn data_kind(positional: bool) -> Self {
        if positional {
            Self::PositionalData
        } else {
            Self::ScoreData
        }
    }

    /// The index-stream kind for the chosen writer identity
    #[must_use]
    pub fn index_kind(positional: bool) -> Self {
        if positional {
            Self::PositionalIndex
        } else {
            Self::ScoreIndex
        }
    }
}

/// The fixed preamble written to both the data and the index stream.
///
/// Stored identically in memory and on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct FileHeader {
    /// File magic number
    magic: [u8; 4],
    /// Kind tag, see [`FileKind`]
    kind: u8,
    /// Reserved for future use
    reserved: u8,
    /// On-disk format version
    version: u16,
    /// Identifier binding one data file to exactly one index file
    file_pair_id: u32,
    /// Guard literal for corruption detection
    guard: u32,
}

impl FileHeader {
    #[must_use]
    pub fn new(kind: FileKind, file_pair_id: u32) -> Self {
        Self {
            magic: *FILE_MAGIC,
            kind: kind as u8,
            reserved: 0,
            version: FORMAT_VERSION,
            file_pair_id,
            guard: GUARD,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Casts raw bytes into a header, checking only the magic number.
    /// Role, version, and guard checks happen in [`FileHeader::validate`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header: Self = *bytemuck::from_bytes(bytes);
        if header.magic != *FILE_MAGIC {
            return Err(HeaderError::InvalidMagicNumber(header.magic).into());
        }
        Ok(header)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; SIZE_HEADER];
        reader.read_exact(&mut buf)?;
        Self::from_bytes(&buf)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.as_bytes())?;
        Ok(())
    }

    /// Checks kind tag, format version, and guard literal, in that order.
    ///
    /// The file-pair id is checked separately by the reader once both
    /// headers of a pair are available.
    pub fn validate(&self, expected: FileKind) -> Result<()> {
        let kind = FileKind::from_u8(self.kind)?;
        if kind != expected {
            return Err(HeaderError::FileKindMismatch {
                expected,
                found: kind,
            }
            .into());
        }
        if self.version != FORMAT_VERSION {
            return Err(HeaderError::FormatVersionMismatch {
                expected: FORMAT_VERSION,
                found: self.version,
            }
            .into());
        }
        if self.guard != GUARD {
            return Err(HeaderError::GuardMismatch {
                expected: GUARD,
                found: self.guard,
            }
            .into());
        }
        Ok(())
    }

    pub fn kind(&self) -> Result<FileKind> {
        FileKind::from_u8(self.kind)
    }

    #[must_use]
    pub fn version(&self) -> u16 {
        self.version
    }

    #[must_use]
    pub fn file_pair_id(&self) -> u32 {
        self.file_pair_id
    }

    #[cfg(test)]
    pub(crate) fn with_fields(kind: u8, version: u16, file_pair_id: u32, guard: u32) -> Self {
        Self {
            magic: *FILE_MAGIC,
            kind,
            reserved: 0,
            version,
            file_pair_id,
            guard,
        }
    }
}

/// Provenance stamp for the annotation source a file pair was built from,
/// embedded in the index stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceVersion {
    pub name: String,
    pub version: String,
    /// Release timestamp of the source data, seconds since the Unix epoch
    pub release_date: i64,
    pub description: String,
}

impl DataSourceVersion {
    #[must_use]
    pub fn new(name: &str, version: &str, release_date: i64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            release_date,
            description: description.to_string(),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.name)?;
        write_string(writer, &self.version)?;
        writer.write_i64::<LittleEndian>(self.release_date)?;
        write_string(writer, &self.description)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let name = read_string(reader)?;
        let version = read_string(reader)?;
        let release_date = reader.read_i64::<LittleEndian>()?;
        let description = read_string(reader)?;
        Ok(Self {
            name,
            version,
            release_date,
            description,
        })
    }
}

impl std::fmt::Display for DataSourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.version)
    }
}

#[cfg(test)]
mod testing {
    use std::io::Cursor;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_header_size() {
        assert_eq!(SIZE_HEADER, 16);
    }

    #[test]
    fn test_header_roundtrip() -> Result<()> {
        let header = FileHeader::new(FileKind::ScoreData, 42);
        let mut buf = Vec::new();
        header.write_to(&mut buf)?;
        assert_eq!(buf.len(), SIZE_HEADER);

        let read = FileHeader::read_from(&mut Cursor::new(buf))?;
        assert_eq!(read, header);
        assert_eq!(read.kind()?, FileKind::ScoreData);
        assert_eq!(read.file_pair_id(), 42);
        read.validate(FileKind::ScoreData)?;
        Ok(())
    }

    #[test]
    fn test_invalid_magic() {
        let mut buf = FileHeader::new(FileKind::ScoreIndex, 1).as_bytes().to_vec();
        buf[0] = b'X';
        let err = FileHeader::from_bytes(&buf).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::InvalidMagicNumber(_))
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_kind() {
        let header = FileHeader::new(FileKind::ScoreIndex, 1);
        let err = header.validate(FileKind::ScoreData).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::FileKindMismatch {
                expected: FileKind::ScoreData,
                found: FileKind::ScoreIndex,
            })
        ));
    }

    #[test]
    fn test_validate_rejects_sibling_format() {
        // A positional-annotation file must never open as a score file.
        let header = FileHeader::new(FileKind::PositionalData, 1);
        assert!(header.validate(FileKind::ScoreData).is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_version() {
        let header = FileHeader::with_fields(FileKind::ScoreData as u8, FORMAT_VERSION + 1, 1, GUARD);
        let err = header.validate(FileKind::ScoreData).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::FormatVersionMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_damaged_guard() {
        let header = FileHeader::with_fields(FileKind::ScoreData as u8, FORMAT_VERSION, 1, 2);
        let err = header.validate(FileKind::ScoreData).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::GuardMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_tag() {
        let header = FileHeader::with_fields(99, FORMAT_VERSION, 1, GUARD);
        let err = header.validate(FileKind::ScoreData).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::UnknownFileKind(99))
        ));
    }

    #[test]
    fn test_data_source_version_roundtrip() -> Result<()> {
        let version = DataSourceVersion::new("gnomAD", "4.1", 1_700_000_000, "genome frequencies");
        let mut buf = Vec::new();
        version.write_to(&mut buf)?;
        let read = DataSourceVersion::read_from(&mut Cursor::new(buf))?;
        assert_eq!(read, version);
        assert_eq!(format!("{read}"), "gnomAD (4.1)");
        Ok(())
    }
}
