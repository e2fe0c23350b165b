//! The block index: a per-chromosome map from genomic positions to data
//! blocks.
//!
//! Blocks cover fixed-length spans of consecutive positions. Boundaries
//! are absolute, anchored to multiples of the block length in 1-based
//! coordinates, so a chromosome's first block starts at the aligned
//! boundary at or below its first annotated position. Blocks with no
//! annotated positions are simply absent: a query landing in a gap,
//! before the first block, or after the last block resolves to `None`,
//! never an error.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{IndexError, Result};

/// The absolute start of the block containing `position`, for 1-based
/// coordinates and boundaries at multiples of `block_length`.
#[must_use]
pub fn align_block_start(position: u64, block_length: u32) -> u64 {
    position - ((position - 1) % u64::from(block_length))
}

/// Splits a position into `(block_number, offset_within_block)` relative
/// to a block-aligned start position, both in position units.
///
/// Returns `None` for positions before the start.
#[must_use]
pub fn block_location(position: u64, start_position: u64, block_length: u32) -> Option<(u32, u32)> {
    if position < start_position {
        return None;
    }
    let delta = position - start_position;
    let block_length = u64::from(block_length);
    Some(((delta / block_length) as u32, (delta % block_length) as u32))
}

/// The persisted per-block entry: which block it is, where its cells
/// start in the data stream, and how many cells were populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMeta {
    /// Logical block number within the chromosome; the block's start
    /// position is `start_position + block_number * block_length`
    pub block_number: u32,
    /// Absolute byte offset of the block's first cell in the data stream
    pub data_offset: u64,
    /// Count of populated cells, for diagnostics and write metrics
    pub populated: u32,
}

/// The ordered, sparse block list of one chromosome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeBlocks {
    start_position: u64,
    blocks: Vec<BlockMeta>,
}

impl ChromosomeBlocks {
    fn new(start_position: u64) -> Self {
        Self {
            start_position,
            blocks: Vec::new(),
        }
    }

    /// Block-aligned start position of block 0
    #[must_use]
    pub fn start_position(&self) -> u64 {
        self.start_position
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn last_block_number(&self) -> Option<u32> {
        self.blocks.last().map(|meta| meta.block_number)
    }

    #[must_use]
    pub fn blocks(&self) -> &[BlockMeta] {
        &self.blocks
    }

    fn push(&mut self, chromosome: u16, meta: BlockMeta) -> Result<()> {
        if let Some(last) = self.blocks.last() {
            if meta.block_number <= last.block_number {
                return Err(IndexError::BlockOutOfOrder {
                    chromosome,
                    previous: last.block_number,
                    block: meta.block_number,
                }
                .into());
            }
        }
        self.blocks.push(meta);
        Ok(())
    }

    fn find(&self, block_number: u32) -> Option<&BlockMeta> {
        self.blocks
            .binary_search_by_key(&block_number, |meta| meta.block_number)
            .ok()
            .map(|i| &self.blocks[i])
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.start_position)?;
        writer.write_u32::<LittleEndian>(self.blocks.len() as u32)?;
        for meta in &self.blocks {
            writer.write_u32::<LittleEndian>(meta.block_number)?;
            writer.write_u64::<LittleEndian>(meta.data_offset)?;
            writer.write_u32::<LittleEndian>(meta.populated)?;
        }
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R, chromosome: u16) -> Result<Self> {
        let start_position = reader.read_u64::<LittleEndian>()?;
        let count = reader.read_u32::<LittleEndian>()?;
        let mut blocks = Self::new(start_position);
        for _ in 0..count {
            let block_number = reader.read_u32::<LittleEndian>()?;
            let data_offset = reader.read_u64::<LittleEndian>()?;
            let populated = reader.read_u32::<LittleEndian>()?;
            blocks.push(
                chromosome,
                BlockMeta {
                    block_number,
                    data_offset,
                    populated,
                },
            )?;
        }
        Ok(blocks)
    }
}

/// Position-to-block resolution for every chromosome in a file pair.
///
/// Built incrementally during a write session, serialized into the index
/// stream, and reconstructed once per reader open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndex {
    chromosomes: BTreeMap<u16, ChromosomeBlocks>,
    block_length: u32,
}

impl BlockIndex {
    #[must_use]
    pub fn new(block_length: u32) -> Self {
        Self {
            chromosomes: BTreeMap::new(),
            block_length,
        }
    }

    #[must_use]
    pub fn block_length(&self) -> u32 {
        self.block_length
    }

    #[must_use]
    pub fn chromosome_count(&self) -> usize {
        self.chromosomes.len()
    }

    /// Total number of blocks across all chromosomes
    #[must_use]
    pub fn total_block_count(&self) -> u64 {
        self.chromosomes
            .values()
            .map(|blocks| blocks.block_count() as u64)
            .sum()
    }

    #[must_use]
    pub fn chromosome(&self, chromosome: u16) -> Option<&ChromosomeBlocks> {
        self.chromosomes.get(&chromosome)
    }

    /// Opens the block list of a new chromosome.
    ///
    /// `start_position` must be block-aligned; each chromosome may be
    /// opened only once per session.
    pub fn add_chromosome(&mut self, chromosome: u16, start_position: u64) -> Result<()> {
        debug_assert_eq!(
            start_position,
            align_block_start(start_position, self.block_length)
        );
        if self.chromosomes.contains_key(&chromosome) {
            return Err(IndexError::DuplicateChromosome(chromosome).into());
        }
        self.chromosomes
            .insert(chromosome, ChromosomeBlocks::new(start_position));
        Ok(())
    }

    /// Records a finished block; blocks within a chromosome must arrive
    /// in strictly increasing block-number order.
    pub fn add_block(
        &mut self,
        chromosome: u16,
        block_number: u32,
        data_offset: u64,
        populated: u32,
    ) -> Result<()> {
        let blocks = self
            .chromosomes
            .get_mut(&chromosome)
            .ok_or(IndexError::MissingChromosome(chromosome))?;
        blocks.push(
            chromosome,
            BlockMeta {
                block_number,
                data_offset,
                populated,
            },
        )
    }

    /// The logical block number containing `position`, or `None` when the
    /// position lies in a gap, before the first block, after the last
    /// block, or on an unknown chromosome.
    #[must_use]
    pub fn block_number(&self, chromosome: u16, position: u64) -> Option<u32> {
        self.lookup(chromosome, position).map(|(_, meta)| meta.block_number)
    }

    /// Resolves a position to its block's start position and metadata,
    /// with the same gap semantics as [`BlockIndex::block_number`].
    #[must_use]
    pub fn lookup(&self, chromosome: u16, position: u64) -> Option<(u64, &BlockMeta)> {
        let blocks = self.chromosomes.get(&chromosome)?;
        let (number, _) = block_location(position, blocks.start_position, self.block_length)?;
        let meta = blocks.find(number)?;
        let block_start = blocks.start_position + u64::from(number) * u64::from(self.block_length);
        Some((block_start, meta))
    }

    /// Byte offset in the data stream of the block containing `position`
    #[must_use]
    pub fn file_offset(&self, chromosome: u16, position: u64) -> Option<u64> {
        self.lookup(chromosome, position).map(|(_, meta)| meta.data_offset)
    }

    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<LittleEndian>(self.chromosomes.len() as u16)?;
        for (&chromosome, blocks) in &self.chromosomes {
            writer.write_u16::<LittleEndian>(chromosome)?;
            blocks.write_to(writer)?;
        }
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(reader: &mut R, block_length: u32) -> Result<Self> {
        let count = reader.read_u16::<LittleEndian>()?;
        let mut index = Self::new(block_length);
        for _ in 0..count {
            let chromosome = reader.read_u16::<LittleEndian>()?;
            let blocks = ChromosomeBlocks::read_from(reader, chromosome)?;
            index.chromosomes.insert(chromosome, blocks);
        }
        Ok(index)
    }
}
