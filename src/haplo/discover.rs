//! Haplotype discovery: a seed pass over variant pairs followed by one
//! round of expansion to maximal per-variant candidates.

use super::haplotype::{Haplotype, OccurrenceTable};
use super::linkage::{linkage, LinkageResult};
use super::simulate::{simulate, SimulationParams};
use crate::calling::Variant;
use crate::reads::AlignmentRecord;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct DiscoveryParams {
    /// Minimum count required in the all-alternate cell.
    pub min_depth: u64,
    /// Maximum linkage p-value.
    pub significance: f64,
    pub iterations: usize,
    pub seed: u64,
}

/// The empirical evidence retained for one haplotype.
#[derive(Debug, Clone)]
pub struct HaplotypeEvidence {
    pub table: OccurrenceTable,
    pub delta: f64,
    pub p_value: f64,
}

/// A NaN p-value (degenerate table) never passes.
pub fn passes_gate(evidence: &HaplotypeEvidence, params: &DiscoveryParams) -> bool {
    !evidence.p_value.is_nan()
        && evidence.p_value <= params.significance
        && evidence.table.all_alternate() >= params.min_depth
}

/// Finds the variant subsets that co-occur on reads more often than
/// chance predicts, mapping each to its occurrence evidence.
///
/// Expansion is a single pass: variants first discovered inside an
/// expanded candidate do not seed a further round.
pub fn discover<R: AlignmentRecord + Sync>(
    variants: &[Variant],
    reads: &[R],
    params: &DiscoveryParams,
) -> HashMap<Haplotype, HaplotypeEvidence> {
    let pairs: Vec<Haplotype> = variants
        .iter()
        .tuple_combinations()
        .map(|(a, b)| Haplotype::pair(a, b))
        .filter(|hap| hap.len() == 2)
        .collect();
    log::debug!("Evaluating {} variant pairs", pairs.len());

    let mut results: HashMap<Haplotype, HaplotypeEvidence> =
        evaluate_all(pairs, reads, params).collect();
    log::debug!("{} pairs pass the acceptance gate", results.len());

    let candidates = expand_candidates(results.keys());
    let fresh: Vec<Haplotype> = candidates
        .into_iter()
        .filter(|hap| !results.contains_key(hap))
        .collect();
    log::debug!("Re-evaluating {} expanded candidates", fresh.len());

    results.extend(evaluate_all(fresh, reads, params));
    results
}

fn evaluate_all<'a, R: AlignmentRecord + Sync>(
    haplotypes: Vec<Haplotype>,
    reads: &'a [R],
    params: &'a DiscoveryParams,
) -> impl Iterator<Item = (Haplotype, HaplotypeEvidence)> + 'a {
    let evaluated: Vec<(Haplotype, HaplotypeEvidence)> = haplotypes
        .into_par_iter()
        .map(|hap| {
            let evidence = evaluate(&hap, reads, params);
            (hap, evidence)
        })
        .collect();
    evaluated
        .into_iter()
        .filter(move |(_, evidence)| passes_gate(evidence, params))
}

fn evaluate<R: AlignmentRecord + Sync>(
    haplotype: &Haplotype,
    reads: &[R],
    params: &DiscoveryParams,
) -> HaplotypeEvidence {
    let sim_params = SimulationParams {
        iterations: params.iterations,
        seed: params.seed ^ stable_hash(haplotype),
    };
    let table = simulate(haplotype, reads, &sim_params);
    let LinkageResult { delta, p_value } = linkage(&table);
    HaplotypeEvidence {
        table,
        delta,
        p_value,
    }
}

/// For every variant in a retained pair, the sorted union of all
/// mutations appearing in any retained pair containing it, deduplicated
/// across variants.
fn expand_candidates<'a>(retained: impl Iterator<Item = &'a Haplotype>) -> HashSet<Haplotype> {
    let mut unions: HashMap<Variant, BTreeSet<Variant>> = HashMap::new();
    for hap in retained {
        for variant in hap.mutations() {
            unions
                .entry(variant.clone())
                .or_default()
                .extend(hap.mutations().iter().cloned());
        }
    }
    unions
        .into_values()
        .map(|set| Haplotype::new(set.into_iter().collect()))
        .collect()
}

/// Content hash of the haplotype, mixed into the base seed so each
/// candidate draws an independent random stream while staying
/// reproducible run to run.
fn stable_hash(haplotype: &Haplotype) -> u64 {
    let mut hasher = DefaultHasher::new();
    haplotype.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::test_utils::make_read;
    use crate::reads::AlignedRead;

    fn variant(pos: i64, alt: &str) -> Variant {
        Variant::new("chr1", pos, "A", alt, 30.0, 20, 10)
    }

    fn params() -> DiscoveryParams {
        DiscoveryParams {
            min_depth: 10,
            significance: 0.05,
            iterations: 200,
            seed: 17,
        }
    }

    /// Reads carrying G at 102, 105 and 108 together, or none of them.
    fn triple_linked_reads() -> Vec<AlignedRead> {
        let mut reads = Vec::new();
        for _ in 0..6 {
            reads.push(make_read("chr1", 100, "12M", "AAGAAGAAGAAA"));
            reads.push(make_read("chr1", 100, "12M", "AAAAAAAAAAAA"));
        }
        reads
    }

    #[test]
    fn linked_pair_is_discovered_and_unlinked_variant_rejected() {
        let reads = triple_linked_reads();
        // T at 110 never occurs on any read
        let variants = vec![variant(102, "G"), variant(105, "G"), variant(110, "T")];
        let results = discover(&variants[..2], &reads, &params());
        assert_eq!(results.len(), 1);

        let (hap, evidence) = results.iter().next().unwrap();
        let positions: Vec<i64> = hap.mutations().iter().map(|m| m.position()).collect();
        assert_eq!(positions, vec![102, 105]);
        assert!(evidence.delta > 0.0);
        assert!(evidence.p_value <= 0.05);
        assert!(evidence.table.all_alternate() >= 10);

        let with_absent = discover(&variants, &reads, &params());
        assert!(with_absent
            .keys()
            .all(|hap| hap.mutations().iter().all(|m| m.position() != 110)));
    }

    #[test]
    fn three_linked_variants_expand_to_one_triple() {
        let reads = triple_linked_reads();
        let variants = vec![variant(102, "G"), variant(105, "G"), variant(108, "G")];
        let results = discover(&variants, &reads, &params());

        // three retained pairs plus the expanded triple
        assert_eq!(results.len(), 4);
        let triple = Haplotype::new(variants.clone());
        let evidence = results.get(&triple).expect("expanded triple missing");
        assert!(evidence.delta > 0.0);
        assert!(evidence.table.all_alternate() >= 10);
    }

    #[test]
    fn discovery_is_deterministic_under_a_fixed_seed() {
        let reads = triple_linked_reads();
        let variants = vec![variant(102, "G"), variant(105, "G"), variant(108, "G")];
        let a = discover(&variants, &reads, &params());
        let b = discover(&variants, &reads, &params());
        assert_eq!(a.len(), b.len());
        for (hap, evidence) in &a {
            assert_eq!(b[hap].table, evidence.table);
        }
    }

    #[test]
    fn uncovered_variants_produce_no_haplotypes() {
        let reads = triple_linked_reads();
        let variants = vec![variant(500, "G"), variant(505, "G")];
        assert!(discover(&variants, &reads, &params()).is_empty());
    }
}
