use crate::utils::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter};
use owo_colors::{
    colors::{Blue, Green, Magenta, Red, Yellow},
    OwoColorize, Stream, Style,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub const FULL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name="snvlink",
          version=FULL_VERSION,
          about="SNV calling and resampling-based haplotype linkage",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Enable or disable color output in logging
    #[arg(long, value_enum, default_value_t = Color::Auto, global = true, help_heading = "Advanced")]
    color: Color,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Call variants from pileup counts")]
    Call(CallArgs),
    #[clap(about = "Call variants and find linked haplotypes")]
    Link(LinkArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Call(_) => "call",
            Command::Link(_) => "link",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct CallArgs {
    /// Pileup counts file (bam-readcount format)
    #[arg(
        short = 'p',
        long = "pileup",
        value_name = "PILEUP",
        value_parser = check_file_exists,
        required = true
    )]
    pub pileup_path: PathBuf,

    /// Reference genome recorded in the VCF header
    #[arg(short = 'g', long = "genome", value_name = "FASTA", required = true)]
    pub reference: String,

    /// Output VCF path
    #[arg(
        short = 'o',
        long = "output",
        value_name = "VCF",
        value_parser = check_prefix_path,
        required = true
    )]
    pub output_path: PathBuf,

    /// Minimum alternate allele count
    #[arg(long = "min-depth", value_name = "COUNT", default_value = "10")]
    pub min_depth: u32,

    /// Minimum mean base quality of alternate observations
    #[arg(long = "min-qual", value_name = "QUAL", default_value = "20")]
    pub min_quality: f64,

    /// Minimum mean fractional read position of alternate observations
    #[arg(
        long = "min-pos",
        value_name = "FRAC",
        default_value = "0.1",
        value_parser = ensure_unit_float
    )]
    pub min_position: f64,

    /// Minimum alternate allele frequency
    #[arg(
        long = "min-freq",
        value_name = "FRAC",
        default_value = "0.05",
        value_parser = ensure_unit_float
    )]
    pub min_frequency: f64,

    /// Maximum Fisher exact test p-value of a call
    #[arg(
        long = "significance",
        value_name = "PVAL",
        default_value = "1e-5",
        value_parser = ensure_unit_float
    )]
    pub significance: f64,
}

impl CallArgs {
    pub fn preflight(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct LinkArgs {
    #[command(flatten)]
    pub call: CallArgs,

    /// BAM file with the aligned reads behind the pileup
    #[arg(
        short = 'r',
        long = "reads",
        value_name = "BAM",
        value_parser = check_file_exists,
        required = true
    )]
    pub reads_path: PathBuf,

    /// Output path for the haplotype report
    #[arg(
        long = "report",
        value_name = "REPORT",
        value_parser = check_prefix_path,
        required = true
    )]
    pub report_path: PathBuf,

    /// Maximum linkage p-value of a haplotype
    #[arg(
        long = "hap-significance",
        value_name = "PVAL",
        default_value = "0.05",
        value_parser = ensure_unit_float
    )]
    pub hap_significance: f64,

    /// Minimum occurrence count of the fully-alternate haplotype
    #[arg(long = "hap-depth", value_name = "COUNT", default_value = "10")]
    pub hap_depth: u64,

    /// Number of resampling iterations per haplotype
    #[arg(
        long = "iterations",
        value_name = "N",
        default_value_t = crate::haplo::DEFAULT_ITERATIONS
    )]
    pub iterations: usize,

    /// Random seed; a fixed seed makes runs reproducible
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Haplotype finding engine
    #[arg(
        long = "method",
        value_name = "METHOD",
        value_enum,
        default_value_t = LinkageMethod::Simulation,
        help_heading = "Advanced"
    )]
    pub method: LinkageMethod,

    /// Number of threads
    #[arg(
        short = 't',
        long = "threads",
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,
}

impl LinkArgs {
    pub fn preflight(&self) -> Result<()> {
        if self.method == LinkageMethod::Exact {
            return Err(
                "The exact haplotype finder is not available in this build; use --method simulation"
                    .to_string(),
            );
        }
        if self.iterations == 0 {
            return Err("Number of iterations must be at least 1".to_string());
        }
        self.call.preflight()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkageMethod {
    /// Monte Carlo read resampling
    Simulation,
    /// Deterministic enumeration (not available)
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

impl Color {
    fn apply(self) {
        match self {
            Color::Auto => {}
            Color::Always => owo_colors::set_override(true),
            Color::Never => owo_colors::set_override(false),
        }
    }
}

pub fn init_verbose(args: &Cli) {
    args.color.apply();

    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(format_log)
        .filter_level(filter_level)
        .init();
}

#[inline(always)]
fn level_style(level: Level) -> (&'static str, Style) {
    match level {
        Level::Error => ("ERROR", Style::new().fg::<Red>().bold()),
        Level::Warn => ("WARN", Style::new().fg::<Yellow>()),
        Level::Info => ("INFO", Style::new().fg::<Green>()),
        Level::Debug => ("DEBUG", Style::new().fg::<Blue>()),
        Level::Trace => ("TRACE", Style::new().fg::<Magenta>()),
    }
}

fn format_log(buf: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    let (label, style) = level_style(record.level());
    let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let painted_label = label.if_supports_color(Stream::Stderr, |t| style.style(t));
    writeln!(buf, "{ts} [{}] - {}", painted_label, record.args())
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(PathBuf::from(s))
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_unit_float_rejects_out_of_range() {
        assert!(ensure_unit_float("0.5").is_ok());
        assert!(ensure_unit_float("1.5").is_err());
        assert!(ensure_unit_float("nope").is_err());
    }

    #[test]
    fn threads_in_range_requires_at_least_one() {
        assert_eq!(threads_in_range("4"), Ok(4));
        assert!(threads_in_range("0").is_err());
    }
}
