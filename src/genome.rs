//! Genome assemblies, pseudoautosomal regions, and the reference seam.
//!
//! The genome itself is an external collaborator: the writer only needs an
//! assembly tag and per-base reference lookups, consumed through the
//! narrow [`SequenceProvider`] trait.

use auto_impl::auto_impl;

use crate::error::{ReadError, Result};

/// Index of chromosome X in the 0-based chromosome numbering (chr1 = 0)
pub const CHROM_X: u16 = 22;

/// Index of chromosome Y in the 0-based chromosome numbering (chr1 = 0)
pub const CHROM_Y: u16 = 23;

/// Genome assembly a file pair was built against
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenomeAssembly {
    #[default]
    Unknown = 0,
    Grch37 = 37,
    Grch38 = 38,
}

impl GenomeAssembly {
    pub(crate) fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unknown),
            37 => Ok(Self::Grch37),
            38 => Ok(Self::Grch38),
            other => Err(ReadError::UnknownAssembly(other).into()),
        }
    }
}

/// A pseudoautosomal interval, 1-based and inclusive on both ends
struct ParRegion {
    chromosome: u16,
    start: u64,
    end: u64,
}

const PAR_GRCH37: [ParRegion; 4] = [
    ParRegion { chromosome: CHROM_X, start: 60_001, end: 2_699_520 },
    ParRegion { chromosome: CHROM_X, start: 154_931_044, end: 155_260_560 },
    ParRegion { chromosome: CHROM_Y, start: 10_001, end: 2_649_520 },
    ParRegion { chromosome: CHROM_Y, start: 59_034_050, end: 59_363_566 },
];

const PAR_GRCH38: [ParRegion; 4] = [
    ParRegion { chromosome: CHROM_X, start: 10_001, end: 2_781_479 },
    ParRegion { chromosome: CHROM_X, start: 155_701_383, end: 156_030_895 },
    ParRegion { chromosome: CHROM_Y, start: 10_001, end: 2_781_479 },
    ParRegion { chromosome: CHROM_Y, start: 56_887_903, end: 57_217_415 },
];

/// Checks whether a position lies on a pseudoautosomal region of the sex
/// chromosomes, where coordinates are shared between X and Y and a single
/// reference call cannot be asserted.
///
/// An `Unknown` assembly matches against the union of the GRCh37 and
/// GRCh38 intervals.
#[must_use]
pub fn is_pseudoautosomal(assembly: GenomeAssembly, chromosome: u16, position: u64) -> bool {
    let in_table = |table: &[ParRegion]| {
        table
            .iter()
            .any(|r| r.chromosome == chromosome && (r.start..=r.end).contains(&position))
    };
    match assembly {
        GenomeAssembly::Grch37 => in_table(&PAR_GRCH37),
        GenomeAssembly::Grch38 => in_table(&PAR_GRCH38),
        GenomeAssembly::Unknown => in_table(&PAR_GRCH37) || in_table(&PAR_GRCH38),
    }
}

/// Reference genome access used to validate incoming records.
///
/// Implementations are expected to be cheap per call; the writer queries
/// one base per reference-allele character.
#[auto_impl(&, Box, Arc)]
pub trait SequenceProvider {
    /// The assembly this provider serves
    fn assembly(&self) -> GenomeAssembly;

    /// The uppercase reference base at a 1-based position, or `None` when
    /// the chromosome or position is outside the catalog
    fn reference_base(&self, chromosome: u16, position: u64) -> Option<u8>;
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_assembly_roundtrip() {
        for assembly in [
            GenomeAssembly::Unknown,
            GenomeAssembly::Grch37,
            GenomeAssembly::Grch38,
        ] {
            assert_eq!(GenomeAssembly::from_u8(assembly as u8).unwrap(), assembly);
        }
        assert!(GenomeAssembly::from_u8(19).is_err());
    }

    #[test]
    fn test_par_membership() {
        assert!(is_pseudoautosomal(GenomeAssembly::Grch38, CHROM_Y, 10_001));
        assert!(is_pseudoautosomal(GenomeAssembly::Grch38, CHROM_Y, 2_781_479));
        assert!(!is_pseudoautosomal(GenomeAssembly::Grch38, CHROM_Y, 2_781_480));
        assert!(is_pseudoautosomal(GenomeAssembly::Grch37, CHROM_X, 60_001));
        assert!(!is_pseudoautosomal(GenomeAssembly::Grch37, CHROM_X, 60_000));
        assert!(is_pseudoautosomal(GenomeAssembly::Grch37, CHROM_X, 155_000_000));
    }

    #[test]
    fn test_par_is_limited_to_sex_chromosomes() {
        assert!(!is_pseudoautosomal(GenomeAssembly::Grch38, 0, 10_001));
        assert!(!is_pseudoautosomal(GenomeAssembly::Grch38, 21, 10_001));
    }

    #[test]
    fn test_unknown_assembly_uses_interval_union() {
        // 60_001 is PAR1 on GRCh37 only; 10_001 on X is PAR1 on GRCh38 only.
        assert!(is_pseudoautosomal(GenomeAssembly::Unknown, CHROM_X, 60_001));
        assert!(is_pseudoautosomal(GenomeAssembly::Unknown, CHROM_X, 10_001));
    }
}
