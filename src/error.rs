use std::error::Error as StdError;

use crate::header::FileKind;

/// Custom Result type for binscore operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the binscore library, encompassing all possible
/// error cases that can occur while building or querying a score file pair.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Errors related to file headers and version stamps
    #[error("Error processing header: {0}")]
    Header(#[from] HeaderError),

    /// Errors raised by the score codecs
    #[error("Error encoding scores: {0}")]
    Codec(#[from] CodecError),

    /// Errors related to the block index
    #[error("Error processing index: {0}")]
    Index(#[from] IndexError),

    /// Errors that occur during write sessions
    #[error("Error writing file: {0}")]
    Write(#[from] WriteError),

    /// Errors that occur while reading a file pair
    #[error("Error reading file: {0}")]
    Read(#[from] ReadError),

    /// Strict-mode record validation failures
    #[error("Record failed validation: {0}")]
    Validation(#[from] ValidationError),

    /// Standard I/O errors
    #[error("Error with IO: {0}")]
    Io(#[from] std::io::Error),

    /// Conversion errors from anyhow errors
    #[cfg(feature = "anyhow")]
    #[error("Generic error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Generic errors for other unexpected situations
    #[error("Generic error: {0}")]
    Generic(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    /// Checks whether the error was caused by caller-supplied input
    /// (out-of-range scores, unsorted records, mismatched file pairings)
    /// rather than by a malformed or truncated file.
    ///
    /// Tooling can use this to tell "fix your input / regenerate the pair"
    /// apart from "the file on disk is damaged".
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Header(err) => !matches!(err, HeaderError::InvalidMagicNumber(_)),
            Self::Codec(err) => matches!(
                err,
                CodecError::ScoreOutOfRange { .. }
                    | CodecError::UnknownScore(_)
                    | CodecError::UnsupportedPrecision { .. }
            ),
            Self::Index(_) | Self::Write(_) | Self::Validation(_) => true,
            _ => false,
        }
    }
}

/// Errors specific to reading and validating file headers
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The magic number in the header does not match the expected value
    #[error("Invalid magic number: {0:?}")]
    InvalidMagicNumber([u8; 4]),

    /// The kind tag does not match the role the reader expected,
    /// e.g. an index file offered where data was expected, or a
    /// positional-annotation file offered to a score reader
    #[error("File kind {found:?} is not supported by this reader, expected {expected:?}")]
    FileKindMismatch { expected: FileKind, found: FileKind },

    /// The kind tag byte is not a known file kind
    #[error("Unknown file kind tag: {0}")]
    UnknownFileKind(u8),

    /// The on-disk format version is not the one this build supports
    #[error("Unsupported format version: {found}, expected {expected}")]
    FormatVersionMismatch { expected: u16, found: u16 },

    /// The guard literal after the header was damaged
    #[error("Guard mismatch: expected {expected:#010x}, found {found:#010x}")]
    GuardMismatch { expected: u32, found: u32 },

    /// The data stream and index stream do not belong to the same pair
    #[error("File pair mismatch: data stream has id {data}, index stream has id {index}")]
    FilePairMismatch { data: u32, index: u32 },

    /// The index payload schema version differs between writer and reader builds
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: u16, found: u16 },
}

/// Errors raised by the quantized and dictionary score codecs
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// A score outside the configured `[0, max_score]` range was supplied
    #[error("Score {score} is outside the encodable range [0, {max_score}]")]
    ScoreOutOfRange { score: f64, max_score: f64 },

    /// A decoded cell held a code above the quantized range
    #[error("Encoded value {code} is outside the quantized range (max {max_code})")]
    CodeOutOfRange { code: u64, max_code: u64 },

    /// The dictionary codec was asked to encode a value never accumulated
    #[error("Score {0} was not added to the dictionary before freezing")]
    UnknownScore(f64),

    /// A decoded cell referenced a dictionary slot that does not exist
    #[error("Encoded value {code} has no dictionary entry (table size {table_size})")]
    UnknownCode { code: u64, table_size: usize },

    /// The requested precision cannot be represented in eight bytes
    #[error("Cannot represent {digits} digits over [0, {max_score}] in a fixed-width cell")]
    UnsupportedPrecision { digits: u8, max_score: f64 },

    /// The serialized codec configuration carried an unknown tag
    #[error("Unknown score codec tag: {0}")]
    UnknownCodecTag(u8),
}

/// Errors related to building the block index
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// A chromosome was opened twice; the record stream must be sorted by
    /// chromosome and a chromosome's records must be contiguous
    #[error("Chromosome {0} was already added to the index")]
    DuplicateChromosome(u16),

    /// A block was added out of order within a chromosome
    #[error("Block {block} on chromosome {chromosome} does not follow block {previous}")]
    BlockOutOfOrder {
        chromosome: u16,
        previous: u32,
        block: u32,
    },

    /// A block was added for a chromosome that was never opened
    #[error("Chromosome {0} has no open block list")]
    MissingChromosome(u16),
}

/// Errors that can occur during a write session
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// Positions within a chromosome must be non-decreasing
    #[error(
        "Position {position} on chromosome {chromosome} is before the previous position {previous}; records must be sorted"
    )]
    PositionOutOfOrder {
        chromosome: u16,
        previous: u64,
        position: u64,
    },

    /// The block length must cover at least one position
    #[error("Invalid block length: {0}")]
    InvalidBlockLength(u32),

    /// The nucleotide alphabet cannot be empty
    #[error("The nucleotide alphabet is empty")]
    EmptyAlphabet,

    /// Each symbol may appear in the alphabet only once
    #[error("Duplicate symbol in nucleotide alphabet: {0}")]
    DuplicateSymbol(String),

    /// Attempted to build a writer without settings
    #[error("Missing settings in writer builder")]
    MissingSettings,

    /// Attempted to build a writer without a data source version stamp
    #[error("Missing data source version in writer builder")]
    MissingVersion,
}

/// Errors that can occur while reading a score file pair
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The data stream is shorter or longer than the index says it should be
    #[error("Data stream holds {found} bytes but the index expects {expected} - possibly truncated")]
    TruncatedFile { expected: u64, found: u64 },

    /// A cell read ran off the end of the data stream
    #[error("Unexpected end of data stream at byte position {offset}")]
    UnexpectedEof { offset: u64 },

    /// A string field in the index stream was not valid UTF-8
    #[error("Malformed UTF-8 string in index stream")]
    MalformedString,

    /// The assembly byte in the index stream is not a known assembly
    #[error("Unknown genome assembly tag: {0}")]
    UnknownAssembly(u8),
}

/// Record-level validation failures, raised only under strict modes
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    /// The record's reference allele disagrees with the genome
    #[error(
        "Reference mismatch at {chromosome}:{position}: record has '{found}', genome has '{expected}'"
    )]
    ReferenceMismatch {
        chromosome: u16,
        position: u64,
        expected: String,
        found: String,
    },

    /// The record is not a single-nucleotide substitution
    #[error("Record at {chromosome}:{position} ('{ref_allele}' -> '{alt_allele}') is not a single-base substitution")]
    NotSingleBase {
        chromosome: u16,
        position: u64,
        ref_allele: String,
        alt_allele: String,
    },
}
