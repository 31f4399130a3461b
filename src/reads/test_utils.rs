use super::alignment::Alignment;
use super::read::AlignedRead;
use rust_htslib::bam::record::CigarString;

pub fn make_read(chrom: &str, left: i64, encoding: &str, bases: &str) -> AlignedRead {
    let cigar = CigarString::try_from(encoding).unwrap();
    let alignment = Alignment::from_cigar(&cigar, left);
    let right = alignment.last_ref_pos().unwrap();
    AlignedRead {
        id: "test_read".to_string(),
        chrom: chrom.to_string(),
        left,
        right,
        alignment,
        bases: bases.as_bytes().to_vec(),
        quals: vec![30; bases.len()],
        mapq: 60,
    }
}
