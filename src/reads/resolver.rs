//! Reference-to-read coordinate resolution and interval queries.
//!
//! All queries take a closed, 1-based reference interval and resolve each
//! position through the read's alignment anchors.

use super::alignment::AlignOp;
use super::read::AlignmentRecord;
use crate::utils::GenomicRegion;
use rayon::prelude::*;

/// Locates the read-sequence coordinate covering `ref_pos`.
///
/// A leading hard-clip run leaves the anchors expressed in full-read
/// coordinates while the stored sequence lacks the clipped prefix; the
/// lookup rebases anchor coordinates by the clip length and reports
/// positions that land outside the rebased sequence span as unresolved.
pub fn resolve_position<R: AlignmentRecord>(record: &R, ref_pos: i64) -> Option<(i64, AlignOp)> {
    let aln = record.alignment();
    let first = aln.anchors.first()?;
    let last = aln.anchors.last()?;
    if ref_pos <= first.ref_pos || ref_pos > last.ref_pos {
        return None;
    }

    let idx = aln.anchors.partition_point(|a| a.ref_pos < ref_pos);
    let prev = &aln.anchors[idx - 1];
    let cur = &aln.anchors[idx];

    let seq_pos = if cur.op.consumes_seq() && cur.op.consumes_ref() {
        prev.seq_pos + (ref_pos - prev.ref_pos)
    } else {
        // A reference-only run holds the sequence coordinate still.
        cur.seq_pos
    } - aln.leading_hard_clip();

    if seq_pos < 1 || seq_pos > record.sequence_length() as i64 {
        return None;
    }
    Some((seq_pos, cur.op))
}

/// Concatenates the read bases covering each position of the interval.
///
/// The result always has `region.len()` bases: unresolved positions yield
/// `N`. The operation type at each position is not inspected, so bases
/// under insertion or deletion runs are spliced in as-is.
pub fn bases_at<R: AlignmentRecord>(region: &GenomicRegion, record: &R) -> Vec<u8> {
    (region.start..=region.end)
        .map(|pos| match resolve_position(record, pos) {
            Some((seq_pos, _)) => record.sequence()[seq_pos as usize - 1],
            None => b'N',
        })
        .collect()
}

/// True iff the read's span covers the interval on the same reference and
/// every position resolves through a match operation.
pub fn contains<R: AlignmentRecord>(region: &GenomicRegion, record: &R) -> bool {
    record.reference_name() == region.contig
        && record.left_position() <= region.start
        && record.right_position() >= region.end
        && (region.start..=region.end)
            .all(|pos| matches!(resolve_position(record, pos), Some((_, op)) if op.is_match()))
}

/// Mean PHRED base quality over the interval positions that resolve
/// through a match operation. `None` when no position matches.
pub fn base_quality<R: AlignmentRecord>(region: &GenomicRegion, record: &R) -> Option<f64> {
    let mut sum = 0u64;
    let mut count = 0u64;
    for pos in region.start..=region.end {
        if let Some((seq_pos, op)) = resolve_position(record, pos) {
            if op.is_match() {
                sum += u64::from(record.qualities()[seq_pos as usize - 1]);
                count += 1;
            }
        }
    }
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Mean of the sequence coordinates resolving the interval's endpoints,
/// as a fraction of the read length.
pub fn fractional_position<R: AlignmentRecord>(
    region: &GenomicRegion,
    record: &R,
) -> Option<f64> {
    let (seq_start, _) = resolve_position(record, region.start)?;
    let (seq_end, _) = resolve_position(record, region.end)?;
    Some((seq_start + seq_end) as f64 / 2.0 / record.sequence_length() as f64)
}

/// Number of reads containing the interval.
pub fn depth<R: AlignmentRecord + Sync>(region: &GenomicRegion, reads: &[R]) -> usize {
    reads.par_iter().filter(|r| contains(region, *r)).count()
}

/// Mean `base_quality` over the reads containing the interval. Reads not
/// containing it are excluded, never counted as zero.
pub fn mean_quality<R: AlignmentRecord + Sync>(
    region: &GenomicRegion,
    reads: &[R],
) -> Option<f64> {
    mean_over_containing(region, reads, base_quality)
}

/// Mean `fractional_position` over the reads containing the interval.
pub fn mean_fractional_position<R: AlignmentRecord + Sync>(
    region: &GenomicRegion,
    reads: &[R],
) -> Option<f64> {
    mean_over_containing(region, reads, fractional_position)
}

fn mean_over_containing<R, F>(region: &GenomicRegion, reads: &[R], value: F) -> Option<f64>
where
    R: AlignmentRecord + Sync,
    F: Fn(&GenomicRegion, &R) -> Option<f64> + Sync,
{
    let values: Vec<f64> = reads
        .par_iter()
        .filter(|r| contains(region, *r))
        .filter_map(|r| value(region, r))
        .collect();
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::test_utils::make_read;
    use crate::utils::GenomicRegion;

    fn region(start: i64, end: i64) -> GenomicRegion {
        GenomicRegion::new("chr1", start, end).unwrap()
    }

    #[test]
    fn resolve_simple_match() {
        let read = make_read("chr1", 100, "10M", "ACGTACGTAC");
        assert_eq!(
            resolve_position(&read, 100),
            Some((1, AlignOp::Match))
        );
        assert_eq!(
            resolve_position(&read, 109),
            Some((10, AlignOp::Match))
        );
        assert_eq!(resolve_position(&read, 99), None);
        assert_eq!(resolve_position(&read, 110), None);
    }

    #[test]
    fn resolve_across_insertion_and_deletion() {
        // ref: 100-107 aligned with an insertion after 103, 108-109 deleted
        let read = make_read("chr1", 100, "4M2I4M2D4M", "AAAATTCCCCGGGG");
        assert_eq!(resolve_position(&read, 103), Some((4, AlignOp::Match)));
        // first base after the insertion
        assert_eq!(resolve_position(&read, 104), Some((7, AlignOp::Match)));
        // deleted positions hold the sequence coordinate still
        assert_eq!(
            resolve_position(&read, 108),
            Some((10, AlignOp::Deletion))
        );
        assert_eq!(resolve_position(&read, 110), Some((11, AlignOp::Match)));
    }

    #[test]
    fn resolve_rebases_leading_hard_clip() {
        let read = make_read("chr1", 100, "5H10M", "ACGTACGTAC");
        assert_eq!(resolve_position(&read, 100), Some((1, AlignOp::Match)));
        assert_eq!(resolve_position(&read, 109), Some((10, AlignOp::Match)));
        assert_eq!(resolve_position(&read, 110), None);
    }

    #[test]
    fn bases_at_preserves_interval_length() {
        let read = make_read("chr1", 100, "10M", "ACGTACGTAC");
        for (start, end) in [(100, 109), (102, 104), (95, 112)] {
            let r = region(start, end);
            assert_eq!(bases_at(&r, &read).len() as i64, r.len());
        }
        assert_eq!(bases_at(&region(98, 101), &read), b"NNAC");
    }

    #[test]
    fn bases_at_reports_bases_under_indel_runs() {
        let read = make_read("chr1", 100, "4M2D4M", "AAAACCCC");
        // deleted reference positions reuse the base left of the deletion
        assert_eq!(bases_at(&region(103, 106), &read), b"AAAC");
    }

    #[test]
    fn contains_requires_match_at_every_position() {
        let clean = make_read("chr1", 100, "10M", "ACGTACGTAC");
        assert!(contains(&region(100, 109), &clean));
        assert!(contains(&region(103, 105), &clean));

        let mismatched = make_read("chr1", 100, "4M1X5M", "ACGTACGTAC");
        assert!(contains(&region(100, 103), &mismatched));
        assert!(!contains(&region(100, 105), &mismatched));

        let gapped = make_read("chr1", 100, "4M2D4M", "ACGTACGT");
        assert!(!contains(&region(100, 107), &gapped));

        let inserted = make_read("chr1", 100, "4M2I4M", "ACGTTTACGT");
        // the insertion sits between reference positions, every interval
        // position still resolves through a match
        assert!(contains(&region(100, 107), &inserted));
    }

    #[test]
    fn contains_requires_same_reference_and_full_span() {
        let read = make_read("chr1", 100, "10M", "ACGTACGTAC");
        let other = GenomicRegion::new("chr2", 100, 105).unwrap();
        assert!(!contains(&other, &read));
        assert!(!contains(&region(95, 105), &read));
        assert!(!contains(&region(105, 115), &read));
    }

    #[test]
    fn base_quality_averages_matching_positions_only() {
        let read = make_read("chr1", 100, "4M2D4M", "AAAACCCC");
        // all stored qualities are 30; deleted positions contribute nothing
        assert_eq!(base_quality(&region(100, 109), &read), Some(30.0));
        let r = GenomicRegion::new("chr2", 200, 210).unwrap();
        assert_eq!(base_quality(&r, &read), None);
    }

    #[test]
    fn fractional_position_is_midpoint_over_length() {
        let read = make_read("chr1", 100, "10M", "ACGTACGTAC");
        let frac = fractional_position(&region(100, 109), &read).unwrap();
        assert!((frac - 0.55).abs() < 1e-12);

        let center = fractional_position(&region(104, 105), &read).unwrap();
        assert!((center - 0.55).abs() < 1e-12);
    }

    #[test]
    fn depth_counts_containing_reads() {
        let reads = vec![
            make_read("chr1", 100, "10M", "ACGTACGTAC"),
            make_read("chr1", 103, "10M", "ACGTACGTAC"),
            make_read("chr1", 100, "4M1X5M", "ACGTACGTAC"),
            make_read("chr2", 100, "10M", "ACGTACGTAC"),
        ];
        let r = region(103, 106);
        assert_eq!(depth(&r, &reads), 2);
        assert_eq!(
            depth(&r, &reads),
            reads.iter().filter(|read| contains(&r, *read)).count()
        );
    }

    #[test]
    fn mean_quality_excludes_non_containing_reads() {
        let mut low = make_read("chr1", 100, "10M", "ACGTACGTAC");
        low.quals = vec![10; 10];
        let high = make_read("chr1", 100, "10M", "ACGTACGTAC");
        let outside = make_read("chr1", 200, "10M", "ACGTACGTAC");
        let reads = vec![low, high, outside];

        let r = region(100, 109);
        assert_eq!(mean_quality(&r, &reads), Some(20.0));
        assert_eq!(mean_fractional_position(&r, &reads), Some(0.55));

        let uncovered = region(150, 160);
        assert_eq!(mean_quality(&uncovered, &reads), None);
    }
}
