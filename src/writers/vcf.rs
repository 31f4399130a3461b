//! Writes called variants as VCF-flavored text (v4.2 headers, not a
//! fully spec-compliant writer).

use crate::calling::{CallerParams, Variant};
use crate::utils::Result;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header lines describing the INFO fields carried by every record.
const VCF_INFO_LINES: [&str; 2] = [
    r#"##INFO=<ID=DP,Number=1,Type=Integer,Description="Combined depth across samples">"#,
    r#"##INFO=<ID=AD,Number=1,Type=Integer,Description="Alternate allele depth">"#,
];

pub struct VcfWriter {
    out: BufWriter<File>,
}

impl VcfWriter {
    /// Creates the output file and writes the full header, including one
    /// `##FILTER` line per calling threshold.
    pub fn new(output_path: &Path, reference: &str, params: &CallerParams) -> Result<VcfWriter> {
        let file = File::create(output_path)
            .map_err(|e| format!("Invalid VCF output path {}: {}", output_path.display(), e))?;
        let mut out = BufWriter::new(file);
        write_header(&mut out, reference, params)
            .map_err(|e| format!("Failed to write VCF header: {}", e))?;
        Ok(VcfWriter { out })
    }

    pub fn write(&mut self, variant: &Variant) -> Result<()> {
        let info = variant
            .info()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .join(";");
        writeln!(
            self.out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            variant.chromosome(),
            variant.position(),
            variant.identifier(),
            variant.reference_allele(),
            variant.alternate_allele(),
            variant.quality(),
            variant.filter_status(),
            info
        )
        .map_err(|e| format!("Failed to write VCF record: {}", e))
    }

    pub fn finish(mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| format!("Failed to flush VCF output: {}", e))
    }
}

fn write_header(out: &mut impl Write, reference: &str, params: &CallerParams) -> std::io::Result<()> {
    writeln!(out, "##fileformat=VCFv4.2")?;
    writeln!(out, "##filedate={}", chrono::Local::now().format("%Y%m%d"))?;
    writeln!(
        out,
        "##source={} {}",
        env!("CARGO_PKG_NAME"),
        crate::cli::FULL_VERSION
    )?;
    writeln!(out, "##reference={}", reference)?;
    writeln!(
        out,
        r#"##FILTER=<ID=d{},Description="Alternate allele count below {}">"#,
        params.min_depth, params.min_depth
    )?;
    writeln!(
        out,
        r#"##FILTER=<ID=q{},Description="Mean base quality below {}">"#,
        params.min_quality, params.min_quality
    )?;
    let percent = (params.min_position * 100.0).round() as u32;
    writeln!(
        out,
        r#"##FILTER=<ID=x{},Description="Mean read position within {}% of the read ends">"#,
        percent, percent
    )?;
    writeln!(
        out,
        r#"##FILTER=<ID=sg,Description="Not significant against the expected error rate (p > {})">"#,
        params.significance
    )?;
    for line in VCF_INFO_LINES.iter() {
        writeln!(out, "{}", line)?;
    }
    writeln!(out, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn params() -> CallerParams {
        CallerParams {
            min_depth: 10,
            min_quality: 20.0,
            min_position: 0.1,
            min_frequency: 0.05,
            significance: 0.05,
        }
    }

    #[test]
    fn header_and_record_layout() {
        let tmp = NamedTempFile::new().unwrap();
        let mut writer = VcfWriter::new(tmp.path(), "ref.fasta", &params()).unwrap();
        writer
            .write(&Variant::new("chr1", 100, "A", "G", 30.0, 20, 10))
            .unwrap();
        writer.finish().unwrap();

        let text = std::fs::read_to_string(tmp.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "##fileformat=VCFv4.2");
        assert!(lines[1].starts_with("##filedate="));
        assert!(lines[2].starts_with("##source=snvlink"));
        assert_eq!(lines[3], "##reference=ref.fasta");
        assert!(lines[4].starts_with("##FILTER=<ID=d10,"));
        assert!(lines[5].starts_with("##FILTER=<ID=q20,"));
        assert!(lines[6].starts_with("##FILTER=<ID=x10,"));
        assert!(lines[7].starts_with("##FILTER=<ID=sg,"));
        assert!(lines[8].starts_with("##INFO=<ID=DP,"));
        assert!(lines[9].starts_with("##INFO=<ID=AD,"));
        assert_eq!(lines[10], "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO");
        assert_eq!(lines[11], "chr1\t100\t.\tA\tG\t30\tPASS\tAD=10;DP=20");
    }
}
