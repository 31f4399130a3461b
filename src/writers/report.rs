//! Writes the nested textual haplotype report.
//!
//! One block per significant haplotype: the linkage evidence followed by
//! the member variants, each annotated with read-backed support computed
//! directly from the loaded read set.

use crate::calling::Variant;
use crate::haplo::{Haplotype, HaplotypeEvidence};
use crate::reads::{resolver, AlignmentRecord};
use crate::utils::{GenomicRegion, Result};
use std::io::Write;

pub fn write_report<W, R>(
    out: &mut W,
    results: &[(Haplotype, HaplotypeEvidence)],
    reads: &[R],
) -> Result<()>
where
    W: Write,
    R: AlignmentRecord + Sync,
{
    render(out, results, reads).map_err(|e| format!("Failed to write haplotype report: {}", e))
}

fn render<W, R>(
    out: &mut W,
    results: &[(Haplotype, HaplotypeEvidence)],
    reads: &[R],
) -> std::io::Result<()>
where
    W: Write,
    R: AlignmentRecord + Sync,
{
    if results.is_empty() {
        return writeln!(out, "haplotypes: []");
    }

    writeln!(out, "haplotypes:")?;
    for (haplotype, evidence) in results {
        writeln!(out, "  - linkage_delta: {:.6}", evidence.delta)?;
        writeln!(out, "    significance: {:e}", evidence.p_value)?;
        writeln!(out, "    occurrences: {}", evidence.table.total())?;
        writeln!(
            out,
            "    all_reference_occurrences: {}",
            evidence.table.all_reference()
        )?;
        writeln!(
            out,
            "    all_alternate_occurrences: {}",
            evidence.table.all_alternate()
        )?;
        writeln!(out, "    mutations:")?;
        for variant in haplotype.mutations() {
            write_variant(out, variant, reads)?;
        }
    }
    Ok(())
}

fn write_variant<W, R>(out: &mut W, variant: &Variant, reads: &[R]) -> std::io::Result<()>
where
    W: Write,
    R: AlignmentRecord + Sync,
{
    writeln!(out, "      - chromosome: {}", variant.chromosome())?;
    writeln!(out, "        position: {}", variant.position())?;
    writeln!(out, "        identifier: {}", variant.identifier())?;
    writeln!(out, "        reference_allele: {}", variant.reference_allele())?;
    writeln!(out, "        alternate_allele: {}", variant.alternate_allele())?;
    writeln!(out, "        quality: {}", variant.quality())?;
    writeln!(out, "        filter: {}", variant.filter_status())?;
    for (key, value) in variant.info() {
        writeln!(out, "        {}: {}", key.to_lowercase(), value)?;
    }

    let end = variant.position() + variant.reference_allele().len() as i64 - 1;
    if let Ok(region) = GenomicRegion::new(variant.chromosome(), variant.position(), end) {
        writeln!(
            out,
            "        spanning_reads: {}",
            resolver::depth(&region, reads)
        )?;
        if let Some(quality) = resolver::mean_quality(&region, reads) {
            writeln!(out, "        spanning_read_quality: {:.2}", quality)?;
        }
        if let Some(fraction) = resolver::mean_fractional_position(&region, reads) {
            writeln!(out, "        spanning_read_position: {:.3}", fraction)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplo::{Call, OccurrenceTable};
    use crate::reads::test_utils::make_read;

    fn evidence() -> HaplotypeEvidence {
        let mut table = OccurrenceTable::new(2);
        for _ in 0..30 {
            table.record(&[Call::Reference, Call::Reference]);
            table.record(&[Call::Alternate, Call::Alternate]);
        }
        HaplotypeEvidence {
            table,
            delta: 0.25,
            p_value: 1.5e-14,
        }
    }

    #[test]
    fn report_lists_haplotype_and_member_variants() {
        let a = Variant::new("chr1", 102, "A", "G", 30.0, 20, 10);
        let b = Variant::new("chr1", 105, "A", "G", 31.0, 22, 12);
        let results = vec![(Haplotype::pair(&a, &b), evidence())];
        let reads = vec![
            make_read("chr1", 100, "10M", "AAGAAGAAAA"),
            make_read("chr1", 100, "10M", "AAAAAAAAAA"),
        ];

        let mut buf = Vec::new();
        write_report(&mut buf, &results, &reads).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("haplotypes:\n"));
        assert!(text.contains("linkage_delta: 0.250000"));
        assert!(text.contains("occurrences: 60"));
        assert!(text.contains("all_alternate_occurrences: 30"));
        assert!(text.contains("position: 102"));
        assert!(text.contains("position: 105"));
        assert!(text.contains("dp: 20"));
        assert!(text.contains("ad: 12"));
        // single-base intervals resolve through match operations on both reads
        assert!(text.contains("spanning_reads: 2"));
        assert!(text.contains("spanning_read_quality: 30.00"));
    }

    #[test]
    fn empty_result_set_writes_an_empty_list() {
        let reads: Vec<crate::reads::AlignedRead> = Vec::new();
        let mut buf = Vec::new();
        write_report(&mut buf, &[], &reads).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "haplotypes: []\n");
    }
}
