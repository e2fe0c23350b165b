/// One score observation produced by upstream parsing.
///
/// Records are transient: they are created by a source-file parser and
/// consumed immediately by the writer. Positions are 1-based; the
/// chromosome index is 0-based (chr1 = 0).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub chromosome: u16,
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub score: f64,
}

impl ScoreRecord {
    #[must_use]
    pub fn new(
        chromosome: u16,
        position: u64,
        ref_allele: &str,
        alt_allele: &str,
        score: f64,
    ) -> Self {
        Self {
            chromosome,
            position,
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
            score,
        }
    }
}
