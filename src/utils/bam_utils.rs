use crate::reads::{AlignedRead, AlignmentRecord};
use crate::utils::Result;
use rust_htslib::bam::{self, Read};
use std::collections::HashSet;
use std::path::Path;

pub fn get_bam_header(bam_path: &Path) -> Result<bam::Header> {
    let reader = bam::Reader::from_path(bam_path)
        .map_err(|e| format!("Failed to open BAM {}: {}", bam_path.display(), e))?;
    Ok(bam::Header::from_template(reader.header()))
}

pub fn is_bam_mapped(bam_header: &bam::Header) -> bool {
    // A mapped input carries SQ tags; the index needs them to fetch data.
    for line in String::from_utf8(bam_header.to_bytes()).unwrap().lines() {
        if line.starts_with("@SQ") {
            return true;
        }
    }
    false
}

/// Loads the aligned reads on the given contigs.
///
/// Uses the BAM index when one is present; otherwise falls back to a full
/// linear scan of the file, which is slower but not fatal.
pub fn load_reads(bam_path: &Path, contigs: &HashSet<String>) -> Result<Vec<AlignedRead>> {
    match bam::IndexedReader::from_path(bam_path) {
        Ok(reader) => load_reads_indexed(reader, bam_path, contigs),
        Err(e) => {
            log::warn!(
                "No usable index for {} ({}); falling back to a full scan",
                bam_path.display(),
                e
            );
            load_reads_scan(bam_path, contigs)
        }
    }
}

fn load_reads_indexed(
    mut reader: bam::IndexedReader,
    bam_path: &Path,
    contigs: &HashSet<String>,
) -> Result<Vec<AlignedRead>> {
    let header = reader.header().clone();
    let mut reads = Vec::new();
    for contig in contigs {
        if reader.fetch(contig.as_str()).is_err() {
            log::warn!("Contig {} not present in {}", contig, bam_path.display());
            continue;
        }
        for rec in reader.records() {
            let rec = rec.map_err(|e| format!("Failed to read {}: {}", bam_path.display(), e))?;
            if let Some(read) = AlignedRead::from_hts_rec(&rec, &header) {
                reads.push(read);
            }
        }
    }
    Ok(reads)
}

fn load_reads_scan(bam_path: &Path, contigs: &HashSet<String>) -> Result<Vec<AlignedRead>> {
    let mut reader = bam::Reader::from_path(bam_path)
        .map_err(|e| format!("Failed to open BAM {}: {}", bam_path.display(), e))?;
    let header = reader.header().clone();
    let mut reads = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(|e| format!("Failed to read {}: {}", bam_path.display(), e))?;
        if let Some(read) = AlignedRead::from_hts_rec(&rec, &header) {
            if contigs.contains(read.reference_name()) {
                reads.push(read);
            }
        }
    }
    Ok(reads)
}
