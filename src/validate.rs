//! Per-record validation applied at write time.
//!
//! Two independent checks — single-base shape and reference-base match —
//! each run in one of three modes. A lenient failure drops the record and
//! keeps the session alive; a strict failure aborts the whole write.

use crate::error::{Result, ValidationError};
use crate::genome::{is_pseudoautosomal, SequenceProvider};
use crate::record::ScoreRecord;

/// How a failed check is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// A violation aborts the write session
    Strict,
    /// A violation silently drops the record
    #[default]
    Lenient,
    /// The check always passes
    Disabled,
}

/// Accepts, drops, or rejects incoming records before they are encoded.
///
/// `validate` returns `Ok(true)` to accept, `Ok(false)` for a lenient
/// drop, and an error only for strict-mode violations, so lenient drops
/// never unwind the writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator {
    snv: ValidationMode,
    reference: ValidationMode,
}

impl RecordValidator {
    #[must_use]
    pub fn new(snv: ValidationMode, reference: ValidationMode) -> Self {
        Self { snv, reference }
    }

    /// A validator that passes every record
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(ValidationMode::Disabled, ValidationMode::Disabled)
    }

    pub fn validate<P: SequenceProvider>(
        &self,
        record: &ScoreRecord,
        provider: &P,
    ) -> Result<bool> {
        match self.snv {
            ValidationMode::Disabled => {}
            mode => {
                if record.ref_allele.len() != 1 || record.alt_allele.len() != 1 {
                    return match mode {
                        ValidationMode::Strict => Err(ValidationError::NotSingleBase {
                            chromosome: record.chromosome,
                            position: record.position,
                            ref_allele: record.ref_allele.clone(),
                            alt_allele: record.alt_allele.clone(),
                        }
                        .into()),
                        _ => Ok(false),
                    };
                }
            }
        }

        match self.reference {
            ValidationMode::Disabled => {}
            mode => {
                // On the pseudoautosomal regions a single reference call
                // cannot be asserted; the wildcard base always passes.
                let par_wildcard = record.ref_allele == "N"
                    && is_pseudoautosomal(provider.assembly(), record.chromosome, record.position);
                if !par_wildcard && !reference_matches(record, provider) {
                    return match mode {
                        ValidationMode::Strict => Err(ValidationError::ReferenceMismatch {
                            chromosome: record.chromosome,
                            position: record.position,
                            expected: expected_reference(record, provider),
                            found: record.ref_allele.clone(),
                        }
                        .into()),
                        _ => Ok(false),
                    };
                }
            }
        }

        Ok(true)
    }
}

fn reference_matches<P: SequenceProvider>(record: &ScoreRecord, provider: &P) -> bool {
    !record.ref_allele.is_empty()
        && record.ref_allele.bytes().enumerate().all(|(i, base)| {
            provider
                .reference_base(record.chromosome, record.position + i as u64)
                .is_some_and(|expected| expected.eq_ignore_ascii_case(&base))
        })
}

fn expected_reference<P: SequenceProvider>(record: &ScoreRecord, provider: &P) -> String {
    (0..record.ref_allele.len() as u64)
        .map(|i| {
            provider
                .reference_base(record.chromosome, record.position + i)
                .map_or('?', char::from)
        })
        .collect()
}
