mod report;
mod vcf;

pub use report::write_report;
pub use vcf::VcfWriter;
