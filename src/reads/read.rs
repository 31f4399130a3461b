//! Representation of one aligned read extracted from an alignment record.

use super::alignment::Alignment;
use rust_htslib::bam::{self, ext::BamRecordExtensions};
use std::str;

/// The alignment-record surface the position resolver works against.
///
/// Concrete record types (BAM-backed reads, synthetic test reads) expose
/// their coordinates and payload through this trait instead of being
/// dispatched on by format.
pub trait AlignmentRecord {
    fn reference_name(&self) -> &str;
    /// 1-based reference position of the leftmost aligned base.
    fn left_position(&self) -> i64;
    /// 1-based reference position of the rightmost aligned base.
    fn right_position(&self) -> i64;
    fn alignment(&self) -> &Alignment;
    fn sequence(&self) -> &[u8];
    fn qualities(&self) -> &[u8];

    fn sequence_length(&self) -> usize {
        self.sequence().len()
    }
}

/// A single aligned read.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRead {
    pub id: String,
    pub chrom: String,
    pub left: i64,
    pub right: i64,
    pub alignment: Alignment,
    pub bases: Vec<u8>,
    pub quals: Vec<u8>,
    pub mapq: u8,
}

impl AlignedRead {
    /// Creates an `AlignedRead` from an HTSlib record.
    ///
    /// Returns `None` for unmapped records, which carry no alignment to
    /// resolve against.
    pub fn from_hts_rec(rec: &bam::Record, header: &bam::HeaderView) -> Option<AlignedRead> {
        if rec.is_unmapped() || rec.tid() < 0 {
            return None;
        }

        let id = str::from_utf8(rec.qname()).ok()?.to_string();
        let chrom = str::from_utf8(header.tid2name(rec.tid() as u32))
            .ok()?
            .to_string();
        let left = rec.reference_start() + 1;
        let right = rec.reference_end();
        let alignment = Alignment::from_cigar(&rec.cigar().take(), left);

        Some(AlignedRead {
            id,
            chrom,
            left,
            right,
            alignment,
            bases: rec.seq().as_bytes(),
            quals: rec.qual().to_vec(),
            mapq: rec.mapq(),
        })
    }
}

impl AlignmentRecord for AlignedRead {
    fn reference_name(&self) -> &str {
        &self.chrom
    }

    fn left_position(&self) -> i64 {
        self.left
    }

    fn right_position(&self) -> i64 {
        self.right
    }

    fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    fn sequence(&self) -> &[u8] {
        &self.bases
    }

    fn qualities(&self) -> &[u8] {
        &self.quals
    }
}
