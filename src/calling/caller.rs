//! The variant-calling filter pipeline.
//!
//! Pileup rows pass a chain of conjunctive filters ending in a two-sided
//! Fisher's exact test of the observed alternate counts against the
//! counts expected from the mean base quality alone.

use super::pileup::PileupRow;
use super::variant::Variant;
use crate::utils::math::{fisher_exact, phred_error};

#[derive(Debug, Clone)]
pub struct CallerParams {
    /// Minimum alternate-allele observation count.
    pub min_depth: u32,
    /// Minimum mean PHRED base quality of alternate observations.
    pub min_quality: f64,
    /// Minimum mean fractional read position of alternate observations.
    pub min_position: f64,
    /// Minimum alternate-allele frequency.
    pub min_frequency: f64,
    /// Maximum Fisher exact test p-value.
    pub significance: f64,
}

/// Runs every pileup row through the filter chain and returns one
/// `Variant` per surviving row, ordered by chromosome and position.
pub fn call_variants(rows: &[PileupRow], params: &CallerParams) -> Vec<Variant> {
    let mut variants: Vec<Variant> = rows
        .iter()
        .filter_map(|row| evaluate_row(row, params))
        .collect();
    variants.sort();
    variants
}

fn evaluate_row(row: &PileupRow, params: &CallerParams) -> Option<Variant> {
    if row.alt_base == row.ref_base {
        return None;
    }
    if row.count < params.min_depth {
        return None;
    }
    if row.avg_base_quality < params.min_quality {
        return None;
    }
    if row.avg_pos_fraction < params.min_position {
        return None;
    }
    if row.depth == 0 || (row.count as f64 / row.depth as f64) < params.min_frequency {
        return None;
    }

    let expected_errors = (phred_error(row.avg_base_quality) * row.depth as f64).round() as u64;
    let p = fisher_exact(
        expected_errors,
        u64::from(row.depth) - expected_errors,
        u64::from(row.count),
        u64::from(row.depth),
    );
    if p > params.significance {
        return None;
    }

    let (ref_allele, alt_allele) = encode_alleles(&row.ref_base, &row.alt_base);
    Some(Variant::new(
        row.chrom.clone(),
        row.position,
        ref_allele,
        alt_allele,
        row.avg_base_quality,
        row.depth,
        row.count,
    ))
}

/// Deletion calls collapse to the `-` sentinel; insertion calls prepend
/// the reference base to the inserted sequence.
fn encode_alleles(ref_base: &str, alt_base: &str) -> (String, String) {
    if let Some(inserted) = alt_base.strip_prefix('+') {
        (ref_base.to_string(), format!("{}{}", ref_base, inserted))
    } else if alt_base.starts_with('-') {
        (ref_base.to_string(), "-".to_string())
    } else {
        (ref_base.to_string(), alt_base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(alt: &str, count: u32, depth: u32, qual: f64, pos_frac: f64) -> PileupRow {
        PileupRow {
            chrom: "chr1".to_string(),
            position: 100,
            ref_base: "A".to_string(),
            depth,
            alt_base: alt.to_string(),
            count,
            avg_mapping_quality: 60.0,
            avg_base_quality: qual,
            avg_pos_fraction: pos_frac,
        }
    }

    fn params() -> CallerParams {
        CallerParams {
            min_depth: 5,
            min_quality: 20.0,
            min_position: 0.1,
            min_frequency: 0.3,
            significance: 0.05,
        }
    }

    #[test]
    fn well_supported_row_survives_all_filters() {
        let variants = call_variants(&[row("G", 10, 20, 30.0, 0.5)], &params());
        assert_eq!(variants.len(), 1);
        let v = &variants[0];
        assert_eq!(v.chromosome(), "chr1");
        assert_eq!(v.position(), 100);
        assert_eq!(v.reference_allele(), "A");
        assert_eq!(v.alternate_allele(), "G");
        assert_eq!(v.info()["DP"], "20");
        assert_eq!(v.info()["AD"], "10");
    }

    #[test]
    fn reference_matching_allele_is_discarded() {
        assert!(call_variants(&[row("A", 10, 20, 30.0, 0.5)], &params()).is_empty());
    }

    #[test]
    fn shallow_allele_is_discarded() {
        assert!(call_variants(&[row("G", 4, 20, 30.0, 0.5)], &params()).is_empty());
    }

    #[test]
    fn low_quality_allele_is_discarded() {
        assert!(call_variants(&[row("G", 10, 20, 15.0, 0.5)], &params()).is_empty());
    }

    #[test]
    fn edge_clustered_allele_is_discarded() {
        assert!(call_variants(&[row("G", 10, 20, 30.0, 0.05)], &params()).is_empty());
    }

    #[test]
    fn low_frequency_allele_is_discarded() {
        assert!(call_variants(&[row("G", 10, 40, 30.0, 0.5)], &params()).is_empty());
    }

    #[test]
    fn error_consistent_allele_fails_significance() {
        // ten alternate reads out of a hundred at Q10 look exactly like
        // sequencing error
        let mut p = params();
        p.min_quality = 5.0;
        p.min_frequency = 0.05;
        assert!(call_variants(&[row("G", 10, 100, 10.0, 0.5)], &p).is_empty());
    }

    #[test]
    fn insertion_allele_prepends_reference_base() {
        let variants = call_variants(&[row("+AG", 10, 20, 30.0, 0.5)], &params());
        assert_eq!(variants[0].reference_allele(), "A");
        assert_eq!(variants[0].alternate_allele(), "AAG");
    }

    #[test]
    fn deletion_allele_stores_sentinel() {
        let variants = call_variants(&[row("-AG", 10, 20, 30.0, 0.5)], &params());
        assert_eq!(variants[0].alternate_allele(), "-");
    }

    #[test]
    fn output_is_sorted_by_chromosome_then_position() {
        let mut rows = vec![row("G", 10, 20, 30.0, 0.5), row("T", 10, 20, 30.0, 0.5)];
        rows[1].position = 50;
        rows[1].chrom = "chr2".to_string();
        let mut third = row("C", 10, 20, 30.0, 0.5);
        third.position = 10;
        rows.push(third);
        let variants = call_variants(&rows, &params());
        let positions: Vec<(String, i64)> = variants
            .iter()
            .map(|v| (v.chromosome().to_string(), v.position()))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("chr1".to_string(), 10),
                ("chr1".to_string(), 100),
                ("chr2".to_string(), 50)
            ]
        );
    }
}
