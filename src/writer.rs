//! The sequential writer: sorted score records in, a data/index stream
//! pair out.
//!
//! A writer instance serves exactly one write session. Records are
//! grouped into fixed-length blocks per chromosome; one block buffer is
//! held in memory at a time, pre-filled with `0xFF` so that untouched
//! cells decode to NaN. Crossing an absolute block boundary flushes the
//! buffer to the data stream and records it in the block index; gaps
//! between annotated regions emit nothing at all.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Result, WriteError};
use crate::genome::SequenceProvider;
use crate::header::{DataSourceVersion, FileHeader, FileKind};
use crate::index::{align_block_start, block_location, BlockIndex};
use crate::record::ScoreRecord;
use crate::settings::{ReaderSettings, WriterSettings};
use crate::{GUARD, SCHEMA_VERSION, SIZE_HEADER};

/// Counters accumulated over one write session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Records accepted and advanced through the writer
    pub records_written: u64,
    /// Records dropped by the lenient validator
    pub records_dropped: u64,
    /// Cells that received an encoded score
    pub cells_written: u64,
    /// Blocks flushed to the data stream
    pub blocks_written: u64,
    /// Chromosomes opened
    pub chromosomes: u16,
}

/// One in-flight block, pre-filled with the NaN sentinel
#[derive(Debug)]
struct BlockBuffer {
    buf: Vec<u8>,
    block_number: u32,
    populated: u32,
    active: bool,
}

impl BlockBuffer {
    fn new(block_bytes: usize) -> Self {
        Self {
            buf: vec![0xFF; block_bytes],
            block_number: 0,
            populated: 0,
            active: false,
        }
    }

    fn open(&mut self, block_number: u32) {
        self.buf.fill(0xFF);
        self.block_number = block_number;
        self.populated = 0;
        self.active = true;
    }

    /// Copies a cell into the buffer; returns whether the cell was
    /// previously untouched.
    fn put(&mut self, offset: usize, cell: &[u8]) -> bool {
        let target = &mut self.buf[offset..offset + cell.len()];
        let fresh = target.iter().all(|&byte| byte == 0xFF);
        if fresh {
            self.populated += 1;
        }
        target.copy_from_slice(cell);
        fresh
    }

    fn close(&mut self) {
        self.active = false;
    }
}

/// Builder for configured [`ScoreWriter`] instances
#[derive(Default)]
pub struct ScoreWriterBuilder {
    settings: Option<WriterSettings>,
    version: Option<DataSourceVersion>,
    schema_version: Option<u16>,
    file_pair_id: Option<u32>,
}

impl ScoreWriterBuilder {
    #[must_use]
    pub fn settings(mut self, settings: WriterSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn version(mut self, version: DataSourceVersion) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub fn schema_version(mut self, schema_version: u16) -> Self {
        self.schema_version = Some(schema_version);
        self
    }

    #[must_use]
    pub fn file_pair_id(mut self, file_pair_id: u32) -> Self {
        self.file_pair_id = Some(file_pair_id);
        self
    }

    pub fn build<W: Write, I: Write, P: SequenceProvider>(
        self,
        data: W,
        index_writer: I,
        provider: P,
    ) -> Result<ScoreWriter<W, I, P>> {
        let Some(settings) = self.settings else {
            return Err(WriteError::MissingSettings.into());
        };
        let Some(version) = self.version else {
            return Err(WriteError::MissingVersion.into());
        };
        ScoreWriter::new(
            data,
            index_writer,
            provider,
            settings,
            version,
            self.schema_version.unwrap_or(SCHEMA_VERSION),
            self.file_pair_id.unwrap_or(0),
        )
    }
}

/// Writes one session of sorted score records into a data/index pair.
///
/// Records must arrive sorted by chromosome, then by non-decreasing
/// position; a position step backwards or a revisited chromosome aborts
/// the session. [`ScoreWriter::push`] returns `Ok(false)` when the
/// lenient validator dropped the record.
#[derive(Debug)]
pub struct ScoreWriter<W: Write, I: Write, P: SequenceProvider> {
    data: W,
    index_writer: I,
    provider: P,
    settings: WriterSettings,
    layout: ReaderSettings,
    version: DataSourceVersion,
    schema_version: u16,
    file_pair_id: u32,
    index: BlockIndex,
    block: BlockBuffer,
    current_chromosome: Option<u16>,
    chromosome_start: u64,
    previous_position: u64,
    data_offset: u64,
    stats: WriteStats,
}

impl<W: Write, I: Write, P: SequenceProvider> ScoreWriter<W, I, P> {
    /// Creates a writer and stamps the data stream header.
    ///
    /// This is a low-level constructor; [`ScoreWriterBuilder`] is the
    /// convenient way to create a writer.
    pub fn new(
        mut data: W,
        index_writer: I,
        provider: P,
        settings: WriterSettings,
        version: DataSourceVersion,
        schema_version: u16,
        file_pair_id: u32,
    ) -> Result<Self> {
        let layout = settings.reader_settings();
        let header = FileHeader::new(FileKind::data_kind(settings.is_positional()), file_pair_id);
        header.write_to(&mut data)?;
        Ok(Self {
            data,
            index_writer,
            provider,
            block: BlockBuffer::new(layout.block_bytes() as usize),
            index: BlockIndex::new(layout.block_length()),
            layout,
            settings,
            version,
            schema_version,
            file_pair_id,
            current_chromosome: None,
            chromosome_start: 0,
            previous_position: 0,
            data_offset: SIZE_HEADER as u64,
            stats: WriteStats::default(),
        })
    }

    /// Validates and writes one record.
    ///
    /// Returns `Ok(true)` when the record was accepted and `Ok(false)`
    /// when the lenient validator dropped it. Records whose alternate
    /// allele is outside the alphabet are accepted but occupy no cell;
    /// lookups for them resolve to NaN.
    pub fn push(&mut self, record: &ScoreRecord) -> Result<bool> {
        if !self.settings.validator().validate(record, &self.provider)? {
            self.stats.records_dropped += 1;
            return Ok(false);
        }

        match self.current_chromosome {
            Some(chromosome) if chromosome == record.chromosome => {
                if record.position < self.previous_position {
                    return Err(WriteError::PositionOutOfOrder {
                        chromosome,
                        previous: self.previous_position,
                        position: record.position,
                    }
                    .into());
                }
            }
            _ => self.start_chromosome(record)?,
        }

        // The ordering checks above keep positions at or after the
        // chromosome start, so the location always resolves.
        let Some((block_number, offset_in_block)) = block_location(
            record.position,
            self.chromosome_start,
            self.layout.block_length(),
        ) else {
            return Err(WriteError::PositionOutOfOrder {
                chromosome: record.chromosome,
                previous: self.previous_position,
                position: record.position,
            }
            .into());
        };

        if !self.block.active || block_number != self.block.block_number {
            self.flush_block()?;
            self.block.open(block_number);
        }

        self.previous_position = record.position;
        self.stats.records_written += 1;

        let Some(slot_offset) = self.layout.slot_offset(&record.alt_allele) else {
            return Ok(true);
        };

        let width = self.layout.width();
        let mut cell = [0u8; 8];
        self.layout.codec().encode(record.score, &mut cell[..width])?;
        let offset = offset_in_block as usize * self.layout.position_width() + slot_offset;
        if self.block.put(offset, &cell[..width]) {
            self.stats.cells_written += 1;
        }
        Ok(true)
    }

    /// Writes every record of an iterator in order
    pub fn write<'a, R>(&mut self, records: R) -> Result<()>
    where
        R: IntoIterator<Item = &'a ScoreRecord>,
    {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }

    /// Running counters for this session
    #[must_use]
    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Flushes the final block, seals the data stream with the guard
    /// footer, and serializes the index stream. Returns both streams and
    /// the session counters.
    pub fn finish(mut self) -> Result<(W, I, WriteStats)> {
        self.flush_block()?;
        self.data.write_u32::<LittleEndian>(GUARD)?;
        self.data.flush()?;

        let header = FileHeader::new(
            FileKind::index_kind(self.settings.is_positional()),
            self.file_pair_id,
        );
        header.write_to(&mut self.index_writer)?;
        self.index_writer.write_u8(self.provider.assembly() as u8)?;
        self.version.write_to(&mut self.index_writer)?;
        self.index_writer.write_u16::<LittleEndian>(self.schema_version)?;
        self.layout.write_to(&mut self.index_writer)?;
        self.index.write_to(&mut self.index_writer)?;
        self.index_writer.flush()?;

        Ok((self.data, self.index_writer, self.stats))
    }

    fn start_chromosome(&mut self, record: &ScoreRecord) -> Result<()> {
        self.flush_block()?;
        let start = align_block_start(record.position, self.layout.block_length());
        self.index.add_chromosome(record.chromosome, start)?;
        self.current_chromosome = Some(record.chromosome);
        self.chromosome_start = start;
        self.previous_position = record.position;
        self.stats.chromosomes += 1;
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if !self.block.active {
            return Ok(());
        }
        let Some(chromosome) = self.current_chromosome else {
            return Ok(());
        };
        self.data.write_all(&self.block.buf)?;
        self.index.add_block(
            chromosome,
            self.block.block_number,
            self.data_offset,
            self.block.populated,
        )?;
        self.data_offset += self.block.buf.len() as u64;
        self.stats.blocks_written += 1;
        self.block.close();
        Ok(())
    }
}
