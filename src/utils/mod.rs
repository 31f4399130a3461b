mod bam_utils;
pub mod math;
mod region;

pub use bam_utils::{get_bam_header, is_bam_mapped, load_reads};
pub use region::GenomicRegion;

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
