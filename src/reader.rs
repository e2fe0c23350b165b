//! The point-query reader over a data/index stream pair.
//!
//! Opening a pair validates both headers, checks that the two streams
//! belong together, reconstructs the block index and codec configuration
//! from the index stream, and cross-checks the data stream length against
//! the index. After that every query is one bounded seek plus one
//! fixed-width read; every absent address (unknown chromosome or allele,
//! gap, before-first, after-last) resolves to NaN without touching the
//! data stream.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;

use crate::error::{HeaderError, ReadError, Result};
use crate::genome::GenomeAssembly;
use crate::header::{DataSourceVersion, FileHeader, FileKind};
use crate::index::BlockIndex;
use crate::settings::ReaderSettings;
use crate::{GUARD, SCHEMA_VERSION, SIZE_HEADER};

/// Size of the guard footer sealing the data stream
const SIZE_FOOTER: u64 = std::mem::size_of::<u32>() as u64;

/// Read-only handle over one score file pair.
///
/// The index and settings are reconstructed once per open and never
/// mutated afterwards; only the data-stream cursor moves during queries.
/// Callers that need concurrent point queries can open one handle per
/// thread.
#[derive(Debug)]
pub struct ScoreReader<R: Read + Seek> {
    data: R,
    settings: ReaderSettings,
    index: BlockIndex,
    assembly: GenomeAssembly,
    version: DataSourceVersion,
    schema_version: u16,
    file_pair_id: u32,
}

impl ScoreReader<Cursor<Mmap>> {
    /// Memory-maps a data file and opens it against its index file.
    pub fn open(data_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(data_path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let index_source = BufReader::new(File::open(index_path)?);
        Self::new(Cursor::new(mmap), index_source)
    }
}

impl<R: Read + Seek> ScoreReader<R> {
    /// Opens a data stream against its paired index stream.
    ///
    /// Checks, in order: both magics, both kind tags, format versions,
    /// guard literals, the file-pair binding, the schema version, and
    /// finally the data stream length implied by the index.
    pub fn new(mut data: R, mut index_source: impl Read) -> Result<Self> {
        let data_header = FileHeader::read_from(&mut data)?;
        data_header.validate(FileKind::ScoreData)?;

        let index_header = FileHeader::read_from(&mut index_source)?;
        index_header.validate(FileKind::ScoreIndex)?;

        if data_header.file_pair_id() != index_header.file_pair_id() {
            return Err(HeaderError::FilePairMismatch {
                data: data_header.file_pair_id(),
                index: index_header.file_pair_id(),
            }
            .into());
        }

        let assembly = GenomeAssembly::from_u8(index_source.read_u8()?)?;
        let version = DataSourceVersion::read_from(&mut index_source)?;
        let schema_version = index_source.read_u16::<LittleEndian>()?;
        if schema_version != SCHEMA_VERSION {
            return Err(HeaderError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: schema_version,
            }
            .into());
        }

        let settings = ReaderSettings::read_from(&mut index_source)?;
        let index = BlockIndex::read_from(&mut index_source, settings.block_length())?;

        let expected =
            SIZE_HEADER as u64 + index.total_block_count() * settings.block_bytes() + SIZE_FOOTER;
        let found = data.seek(SeekFrom::End(0))?;
        if found != expected {
            return Err(ReadError::TruncatedFile { expected, found }.into());
        }
        data.seek(SeekFrom::Start(expected - SIZE_FOOTER))?;
        let footer = data.read_u32::<LittleEndian>()?;
        if footer != GUARD {
            return Err(HeaderError::GuardMismatch {
                expected: GUARD,
                found: footer,
            }
            .into());
        }

        Ok(Self {
            data,
            settings,
            index,
            assembly,
            version,
            schema_version,
            file_pair_id: data_header.file_pair_id(),
        })
    }

    /// The score stored for `(chromosome, position, allele)`, or NaN when
    /// no score was ever written there.
    ///
    /// Errors are reserved for I/O faults and malformed cells; absent
    /// data is never an error.
    pub fn get_score(&mut self, chromosome: u16, position: u64, allele: &str) -> Result<f64> {
        let Some(slot_offset) = self.settings.slot_offset(allele) else {
            return Ok(f64::NAN);
        };
        let Some((block_start, meta)) = self.index.lookup(chromosome, position) else {
            return Ok(f64::NAN);
        };

        let cell_offset = meta.data_offset
            + (position - block_start) * self.settings.position_width() as u64
            + slot_offset as u64;
        self.data.seek(SeekFrom::Start(cell_offset))?;

        let width = self.settings.width();
        let mut cell = [0u8; 8];
        if let Err(e) = self.data.read_exact(&mut cell[..width]) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Err(ReadError::UnexpectedEof {
                    offset: cell_offset,
                }
                .into());
            }
            return Err(e.into());
        }
        self.settings.codec().decode(&cell[..width])
    }

    /// The companion JSON fragment for a lookup, e.g.
    /// `{"phyloP":{"score":0.42}}`, with NaN rendered as `null`.
    pub fn json_fragment(
        &mut self,
        chromosome: u16,
        position: u64,
        allele: &str,
    ) -> Result<String> {
        let score = self.get_score(chromosome, position, allele)?;
        Ok(self.settings.json_encoder().render(score))
    }

    /// The logical block number containing `position`, or `None` for any
    /// absent address
    #[must_use]
    pub fn block_number(&self, chromosome: u16, position: u64) -> Option<u32> {
        self.index.block_number(chromosome, position)
    }

    /// Byte offset in the data stream of the block containing `position`,
    /// or `None` for any absent address
    #[must_use]
    pub fn file_offset(&self, chromosome: u16, position: u64) -> Option<u64> {
        self.index.file_offset(chromosome, position)
    }

    #[must_use]
    pub fn assembly(&self) -> GenomeAssembly {
        self.assembly
    }

    #[must_use]
    pub fn version(&self) -> &DataSourceVersion {
        &self.version
    }

    #[must_use]
    pub fn schema_version(&self) -> u16 {
        self.schema_version
    }

    #[must_use]
    pub fn file_pair_id(&self) -> u32 {
        self.file_pair_id
    }

    #[must_use]
    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    #[must_use]
    pub fn block_length(&self) -> u32 {
        self.settings.block_length()
    }
}
