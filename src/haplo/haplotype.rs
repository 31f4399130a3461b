use crate::calling::Variant;
use crate::utils::math::marginal_sum;

/// Classification of one resampled read at one mutation position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Reference,
    Alternate,
    Other,
}

/// An ordered set of variants hypothesized to co-occur on one molecule.
///
/// Mutations are kept sorted and no two share a position; identity is
/// structural, so haplotypes work as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Haplotype {
    mutations: Vec<Variant>,
}

impl Haplotype {
    pub fn new(mut mutations: Vec<Variant>) -> Haplotype {
        mutations.sort();
        mutations.dedup_by(|a, b| a.chromosome() == b.chromosome() && a.position() == b.position());
        Haplotype { mutations }
    }

    pub fn pair(a: &Variant, b: &Variant) -> Haplotype {
        Haplotype::new(vec![a.clone(), b.clone()])
    }

    pub fn mutations(&self) -> &[Variant] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl std::fmt::Display for Haplotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for m in &self.mutations {
            if !first {
                write!(f, " + ")?;
            }
            write!(f, "{}", m)?;
            first = false;
        }
        Ok(())
    }
}

/// Counts of resampled reads by per-position classification.
///
/// A k-mutation haplotype gets a `2^k` table stored column-major
/// (dimension 0 varies fastest); coordinate 0 along a dimension is a
/// reference-like call, coordinate 1 an alternate-like call. Iterations
/// containing any unresolved (`Other`) call are not recorded in any cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceTable {
    counts: Vec<u64>,
    ndims: usize,
}

impl OccurrenceTable {
    pub fn new(ndims: usize) -> OccurrenceTable {
        OccurrenceTable {
            counts: vec![0; 1 << ndims],
            ndims,
        }
    }

    pub fn ndims(&self) -> usize {
        self.ndims
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Records one iteration's classification vector. Vectors containing
    /// an `Other` call are dropped entirely.
    pub fn record(&mut self, calls: &[Call]) {
        debug_assert_eq!(calls.len(), self.ndims);
        if let Some(cell) = Self::cell_index(calls) {
            self.counts[cell] += 1;
        }
    }

    fn cell_index(calls: &[Call]) -> Option<usize> {
        let mut cell = 0usize;
        for (dim, call) in calls.iter().enumerate() {
            match call {
                Call::Reference => {}
                Call::Alternate => cell |= 1 << dim,
                Call::Other => return None,
            }
        }
        Some(cell)
    }

    /// Number of recorded iterations.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn all_reference(&self) -> u64 {
        self.counts[0]
    }

    pub fn all_alternate(&self) -> u64 {
        self.counts[self.counts.len() - 1]
    }

    /// Count of iterations with a reference-like call at `dim`.
    pub fn marginal_reference(&self, dim: usize) -> u64 {
        marginal_sum(&self.counts, self.ndims, dim, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(pos: i64) -> Variant {
        Variant::new("chr1", pos, "A", "G", 30.0, 20, 10)
    }

    #[test]
    fn mutations_are_sorted_and_position_deduplicated() {
        let hap = Haplotype::new(vec![variant(300), variant(100), variant(300), variant(200)]);
        let positions: Vec<i64> = hap.mutations().iter().map(|m| m.position()).collect();
        assert_eq!(positions, vec![100, 200, 300]);
    }

    #[test]
    fn structural_equality_ignores_construction_order() {
        let a = Haplotype::new(vec![variant(100), variant(200)]);
        let b = Haplotype::new(vec![variant(200), variant(100)]);
        assert_eq!(a, b);
        let mut map = std::collections::HashMap::new();
        map.insert(a, 1);
        assert!(map.contains_key(&b));
    }

    #[test]
    fn record_uses_column_major_cells() {
        let mut table = OccurrenceTable::new(2);
        table.record(&[Call::Alternate, Call::Reference]);
        table.record(&[Call::Reference, Call::Alternate]);
        table.record(&[Call::Alternate, Call::Alternate]);
        assert_eq!(table.counts(), &[0, 1, 1, 1]);
        assert_eq!(table.all_reference(), 0);
        assert_eq!(table.all_alternate(), 1);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn record_drops_vectors_with_unresolved_calls() {
        let mut table = OccurrenceTable::new(2);
        table.record(&[Call::Reference, Call::Other]);
        table.record(&[Call::Other, Call::Other]);
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn marginal_reference_sums_the_fixed_dimension() {
        let mut table = OccurrenceTable::new(2);
        table.record(&[Call::Reference, Call::Reference]);
        table.record(&[Call::Reference, Call::Alternate]);
        table.record(&[Call::Alternate, Call::Alternate]);
        assert_eq!(table.marginal_reference(0), 2);
        assert_eq!(table.marginal_reference(1), 1);
    }
}
