//! # binscore
//!
//! A compact binary file format for genome-wide per-nucleotide scores,
//! with a writer/reader pair built around a data file + index file.
//!
//! Scores (e.g. conservation or pathogenicity values computed for every
//! genomic base and every possible substitution) are grouped into
//! fixed-length blocks per chromosome, encoded through a configurable
//! codec, and looked up by `(chromosome, position, allele)` with a single
//! bounded seek per query. Regions that were never annotated cost nothing
//! on disk and resolve to `NaN` on read.
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use binscore::{
//!     DataSourceVersion, GenomeAssembly, QuantizedCodec, RecordValidator, ScoreJsonEncoder,
//!     ScoreReader, ScoreRecord, ScoreWriterBuilder, SequenceProvider, WriterSettings,
//! };
//!
//! struct AllA;
//! impl SequenceProvider for AllA {
//!     fn assembly(&self) -> GenomeAssembly {
//!         GenomeAssembly::Grch38
//!     }
//!     fn reference_base(&self, _chromosome: u16, _position: u64) -> Option<u8> {
//!         Some(b'A')
//!     }
//! }
//!
//! # fn main() -> binscore::Result<()> {
//! let settings = WriterSettings::new(
//!     10_000,
//!     &["A", "C", "G", "T"],
//!     QuantizedCodec::new(2, 1.0)?.into(),
//!     ScoreJsonEncoder::new("phred", "score"),
//!     RecordValidator::default(),
//! )?;
//! let version = DataSourceVersion::new("example", "1.0", 0, "example scores");
//!
//! let mut writer = ScoreWriterBuilder::default()
//!     .settings(settings)
//!     .version(version)
//!     .file_pair_id(7)
//!     .build(Vec::new(), Vec::new(), AllA)?;
//! writer.push(&ScoreRecord::new(0, 10_001, "A", "C", 0.42))?;
//! let (data, index, _stats) = writer.finish()?;
//!
//! let mut reader = ScoreReader::new(Cursor::new(data), Cursor::new(index))?;
//! assert!((reader.get_score(0, 10_001, "C")? - 0.42).abs() < 0.005);
//! assert!(reader.get_score(0, 10_002, "C")?.is_nan());
//! # Ok(())
//! # }
//! ```

mod codec;
mod error;
mod genome;
mod header;
mod index;
mod reader;
mod record;
mod settings;
mod utils;
mod validate;
mod writer;

pub use codec::{DictionaryBuilder, DictionaryCodec, QuantizedCodec, ScoreCodec, ScoreJsonEncoder};
pub use error::{
    CodecError, Error, HeaderError, IndexError, ReadError, Result, ValidationError, WriteError,
};
pub use genome::{is_pseudoautosomal, GenomeAssembly, SequenceProvider, CHROM_X, CHROM_Y};
pub use header::{DataSourceVersion, FileHeader, FileKind, SIZE_HEADER};
pub use index::{align_block_start, block_location, BlockIndex, BlockMeta, ChromosomeBlocks};
pub use reader::ScoreReader;
pub use record::ScoreRecord;
pub use settings::{ReaderSettings, WriterSettings};
pub use validate::{RecordValidator, ValidationMode};
pub use writer::{ScoreWriter, ScoreWriterBuilder, WriteStats};

/// Magic number identifying binscore files (data and index alike)
pub const FILE_MAGIC: &[u8; 4] = b"BSCR";

/// On-disk format version checked on every open
pub const FORMAT_VERSION: u16 = 1;

/// Version of the index payload schema shared by writer and reader builds
pub const SCHEMA_VERSION: u16 = 1;

/// Guard literal written after each header and at the end of the data
/// stream to detect truncated or corrupted files
pub const GUARD: u32 = 0xB10C_CAFE;

/// Default number of genomic positions covered by one block
pub const DEFAULT_BLOCK_LENGTH: u32 = 10_000;
