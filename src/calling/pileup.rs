//! Parsing of per-base pileup counts produced by an external counting
//! tool (bam-readcount flavored text).
//!
//! Each line is `chrom  pos  ref  depth` followed by one colon-separated
//! block per observed allele:
//! `base:count:avgMapQ:avgBaseQ:avgSEMapQ:numPlus:numMinus:avgPosFrac:`
//! `avgMismatchFrac:avgMismatchQualSum:numQ2Reads:avgDistToQ2:`
//! `avgClippedLen:avgDistTo3p`.

use crate::utils::Result;
use std::io::BufRead;
use std::str::FromStr;

const ROW_FIELD_COUNT: usize = 4;
const ALLELE_FIELD_COUNT: usize = 14;

/// One (position, alternate allele) pair of the pileup.
#[derive(Debug, Clone, PartialEq)]
pub struct PileupRow {
    pub chrom: String,
    pub position: i64,
    pub ref_base: String,
    pub depth: u32,
    pub alt_base: String,
    pub count: u32,
    pub avg_mapping_quality: f64,
    pub avg_base_quality: f64,
    pub avg_pos_fraction: f64,
}

/// Parses pileup text into one row per (position, allele) pair.
///
/// Malformed lines (wrong field counts, non-numeric fields) fail with an
/// error identifying the offending line; they are never silently skipped.
pub fn parse_pileup<R: BufRead>(reader: R) -> Result<Vec<PileupRow>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.map_err(|e| format!("Failed to read pileup line {}: {}", line_number, e))?;
        if line.trim().is_empty() {
            continue;
        }
        parse_line(&line, line_number, &mut rows)?;
    }
    Ok(rows)
}

fn parse_line(line: &str, line_number: usize, rows: &mut Vec<PileupRow>) -> Result<()> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() <= ROW_FIELD_COUNT {
        return Err(format!(
            "Malformed pileup line {}: expected at least {} tab-separated fields, found {}: '{}'",
            line_number,
            ROW_FIELD_COUNT + 1,
            fields.len(),
            line
        ));
    }

    let chrom = fields[0].to_string();
    let position: i64 = parse_field(fields[1], line_number, "position")?;
    let ref_base = fields[2].to_string();
    let depth: u32 = parse_field(fields[3], line_number, "depth")?;

    for block in &fields[ROW_FIELD_COUNT..] {
        let parts: Vec<&str> = block.split(':').collect();
        if parts.len() != ALLELE_FIELD_COUNT {
            return Err(format!(
                "Malformed pileup line {}: expected {} colon-separated allele fields, found {}: '{}'",
                line_number,
                ALLELE_FIELD_COUNT,
                parts.len(),
                block
            ));
        }
        // the '=' placeholder summarizes reference-matching reads
        if parts[0] == "=" {
            continue;
        }
        rows.push(PileupRow {
            chrom: chrom.clone(),
            position,
            ref_base: ref_base.clone(),
            depth,
            alt_base: parts[0].to_string(),
            count: parse_field(parts[1], line_number, "allele count")?,
            avg_mapping_quality: parse_field(parts[2], line_number, "mapping quality")?,
            avg_base_quality: parse_field(parts[3], line_number, "base quality")?,
            avg_pos_fraction: parse_field(parts[7], line_number, "position fraction")?,
        });
    }
    Ok(())
}

fn parse_field<T: FromStr>(value: &str, line_number: usize, what: &str) -> Result<T> {
    value.parse().map_err(|_| {
        format!(
            "Malformed pileup line {}: invalid {} '{}'",
            line_number, what, value
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn block(base: &str, count: u32, base_qual: f64, pos_frac: f64) -> String {
        format!(
            "{}:{}:60.00:{}:0.00:{}:0:{}:0.01:0.00:0:0.00:0.00:0.00",
            base,
            count,
            base_qual,
            count,
            pos_frac
        )
    }

    #[test]
    fn parses_one_row_per_allele_block() {
        let line = format!(
            "chr1\t100\tA\t25\t{}\t{}",
            block("=", 15, 35.0, 0.5),
            block("G", 10, 30.0, 0.45)
        );
        let rows = parse_pileup(Cursor::new(line)).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.chrom, "chr1");
        assert_eq!(row.position, 100);
        assert_eq!(row.ref_base, "A");
        assert_eq!(row.depth, 25);
        assert_eq!(row.alt_base, "G");
        assert_eq!(row.count, 10);
        assert!((row.avg_base_quality - 30.0).abs() < 1e-12);
        assert!((row.avg_pos_fraction - 0.45).abs() < 1e-12);
    }

    #[test]
    fn keeps_indel_allele_blocks() {
        let line = format!("chr1\t100\tA\t25\t{}", block("+AG", 6, 28.0, 0.4));
        let rows = parse_pileup(Cursor::new(line)).unwrap();
        assert_eq!(rows[0].alt_base, "+AG");
    }

    #[test]
    fn rejects_block_with_wrong_field_count() {
        let err = parse_pileup(Cursor::new("chr1\t100\tA\t25\tG:10:60.00")).unwrap_err();
        assert!(err.contains("line 1"), "unexpected error: {}", err);
        assert!(err.contains("colon-separated"), "unexpected error: {}", err);
    }

    #[test]
    fn rejects_non_numeric_depth() {
        let line = format!("chr1\t100\tA\tdeep\t{}", block("G", 10, 30.0, 0.45));
        let err = parse_pileup(Cursor::new(line)).unwrap_err();
        assert!(err.contains("invalid depth"), "unexpected error: {}", err);
    }

    #[test]
    fn rejects_line_without_allele_blocks() {
        let err = parse_pileup(Cursor::new("chr1\t100\tA\t25")).unwrap_err();
        assert!(err.contains("line 1"), "unexpected error: {}", err);
    }

    #[test]
    fn skips_blank_lines() {
        let text = format!("\nchr1\t100\tA\t25\t{}\n\n", block("G", 10, 30.0, 0.45));
        let rows = parse_pileup(Cursor::new(text)).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
