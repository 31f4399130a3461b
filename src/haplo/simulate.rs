//! The resampling simulation at the heart of linkage testing.
//!
//! Each iteration walks the haplotype's mutations in position order,
//! re-drawing an anchor read whenever the current one no longer spans the
//! next mutation, and classifies the anchor's base at every position.
//! Iterations are independent and run in parallel, each with its own RNG
//! seeded from the base seed and the iteration index.

use super::haplotype::{Call, Haplotype, OccurrenceTable};
use crate::calling::Variant;
use crate::reads::{resolver, AlignmentRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

pub const DEFAULT_ITERATIONS: usize = 1000;

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub iterations: usize,
    pub seed: u64,
}

/// Resamples reads `iterations` times and tabulates the joint
/// classifications of every iteration that resolved all positions.
pub fn simulate<R: AlignmentRecord + Sync>(
    haplotype: &Haplotype,
    reads: &[R],
    params: &SimulationParams,
) -> OccurrenceTable {
    let mut table = OccurrenceTable::new(haplotype.len());
    if haplotype.is_empty() {
        return table;
    }

    let classifications: Vec<Vec<Call>> = (0..params.iterations)
        .into_par_iter()
        .map(|iteration| {
            let mut rng = StdRng::seed_from_u64(iteration_seed(params.seed, iteration as u64));
            run_iteration(haplotype, reads, &mut rng)
        })
        .collect();

    for calls in &classifications {
        table.record(calls);
    }
    table
}

/// splitmix64-style mix of the base seed and the iteration index, so a
/// fixed base seed replays identically while iterations stay decorrelated.
fn iteration_seed(base: u64, iteration: u64) -> u64 {
    let mut z = base ^ iteration.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn run_iteration<R: AlignmentRecord>(
    haplotype: &Haplotype,
    reads: &[R],
    rng: &mut StdRng,
) -> Vec<Call> {
    let mutations = haplotype.mutations();
    let first = &mutations[0];

    let pool = spanning_pool(reads, first);
    let Some(mut anchor) = choose(&pool, rng) else {
        // no anchor to extend from makes every position unreachable
        return vec![Call::Other; mutations.len()];
    };

    let mut calls = Vec::with_capacity(mutations.len());
    calls.push(classify(anchor, first));

    for mutation in &mutations[1..] {
        if spans(anchor, mutation) {
            calls.push(classify(anchor, mutation));
            continue;
        }
        let pool = extension_pool(reads, anchor, mutation);
        match choose(&pool, rng) {
            Some(next) => {
                anchor = next;
                calls.push(classify(anchor, mutation));
            }
            // unreachable from here; keep the previous anchor
            None => calls.push(Call::Other),
        }
    }
    calls
}

fn spans<R: AlignmentRecord>(read: &R, mutation: &Variant) -> bool {
    read.reference_name() == mutation.chromosome()
        && read.left_position() < mutation.position()
        && mutation.position() < read.right_position()
}

fn spanning_pool<'a, R: AlignmentRecord>(reads: &'a [R], mutation: &Variant) -> Vec<&'a R> {
    reads.iter().filter(|r| spans(*r, mutation)).collect()
}

/// Reads that start strictly after the current anchor ends, start before
/// the mutation, and end strictly beyond it.
fn extension_pool<'a, R: AlignmentRecord>(
    reads: &'a [R],
    anchor: &R,
    mutation: &Variant,
) -> Vec<&'a R> {
    reads
        .iter()
        .filter(|r| {
            r.reference_name() == mutation.chromosome()
                && r.left_position() > anchor.right_position()
                && r.left_position() < mutation.position()
                && r.right_position() > mutation.position()
        })
        .collect()
}

fn choose<'a, R>(pool: &[&'a R], rng: &mut StdRng) -> Option<&'a R> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.gen_range(0..pool.len())])
    }
}

fn classify<R: AlignmentRecord>(read: &R, mutation: &Variant) -> Call {
    match resolver::resolve_position(read, mutation.position()) {
        Some((seq_pos, _)) => {
            let base = &read.sequence()[seq_pos as usize - 1..seq_pos as usize];
            if base == mutation.reference_allele().as_bytes() {
                Call::Reference
            } else if base == mutation.alternate_allele().as_bytes() {
                Call::Alternate
            } else {
                Call::Other
            }
        }
        None => Call::Other,
    }
}
