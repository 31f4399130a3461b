use super::call::{call_from_pileup, write_vcf};
use crate::cli::LinkArgs;
use crate::haplo::{discover, DiscoveryParams, Haplotype, HaplotypeEvidence};
use crate::utils::{get_bam_header, is_bam_mapped, load_reads, Result};
use crate::writers::write_report;
use rand::Rng;
use rayon::ThreadPoolBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;

pub fn link(args: LinkArgs) -> Result<()> {
    let variants = call_from_pileup(&args.call)?;
    write_vcf(&args.call, &variants)?;

    let bam_header = get_bam_header(&args.reads_path)?;
    if !is_bam_mapped(&bam_header) {
        return Err("Input BAM is not mapped".into());
    }

    let contigs: HashSet<String> = variants
        .iter()
        .map(|v| v.chromosome().to_string())
        .collect();
    let reads = load_reads(&args.reads_path, &contigs)?;
    log::info!(
        "Loaded {} aligned reads from {}",
        reads.len(),
        args.reads_path.display()
    );

    let results = if variants.len() < 2 {
        log::warn!("Fewer than two variants pass filtering; nothing to link");
        Vec::new()
    } else {
        let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
        log::info!("Resampling with seed {}", seed);
        let params = DiscoveryParams {
            min_depth: args.hap_depth,
            significance: args.hap_significance,
            iterations: args.iterations,
            seed,
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(args.num_threads)
            .build()
            .map_err(|e| format!("Failed to create thread pool: {}", e))?;
        let found = pool.install(|| discover(&variants, &reads, &params));

        let mut results: Vec<(Haplotype, HaplotypeEvidence)> = found.into_iter().collect();
        results.sort_by(|(a, _), (b, _)| a.cmp(b));
        results
    };
    log::info!("{} significant haplotypes", results.len());

    let file = File::create(&args.report_path).map_err(|e| {
        format!(
            "Invalid report output path {}: {}",
            args.report_path.display(),
            e
        )
    })?;
    let mut out = BufWriter::new(file);
    write_report(&mut out, &results, &reads)?;
    log::info!("Wrote haplotype report to {}", args.report_path.display());
    Ok(())
}
