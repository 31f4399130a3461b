use crate::calling::{call_variants, parse_pileup, CallerParams, Variant};
use crate::cli::CallArgs;
use crate::utils::Result;
use crate::writers::VcfWriter;
use std::fs::File;
use std::io::BufReader;

pub fn call(args: CallArgs) -> Result<()> {
    let variants = call_from_pileup(&args)?;
    write_vcf(&args, &variants)?;
    log::info!(
        "Wrote {} variants to {}",
        variants.len(),
        args.output_path.display()
    );
    Ok(())
}

pub fn call_from_pileup(args: &CallArgs) -> Result<Vec<Variant>> {
    let file = File::open(&args.pileup_path).map_err(|e| {
        format!(
            "Failed to open pileup {}: {}",
            args.pileup_path.display(),
            e
        )
    })?;
    let rows = parse_pileup(BufReader::new(file))?;
    log::info!(
        "Parsed {} pileup rows from {}",
        rows.len(),
        args.pileup_path.display()
    );

    let variants = call_variants(&rows, &caller_params(args));
    log::info!("{} variants pass all filters", variants.len());
    Ok(variants)
}

pub fn write_vcf(args: &CallArgs, variants: &[Variant]) -> Result<()> {
    let mut writer = VcfWriter::new(&args.output_path, &args.reference, &caller_params(args))?;
    for variant in variants {
        writer.write(variant)?;
    }
    writer.finish()
}

pub fn caller_params(args: &CallArgs) -> CallerParams {
    CallerParams {
        min_depth: args.min_depth,
        min_quality: args.min_quality,
        min_position: args.min_position,
        min_frequency: args.min_frequency,
        significance: args.significance,
    }
}
