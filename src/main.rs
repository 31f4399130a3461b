use clap::Parser;
use snvlink::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{call, link},
    utils::{handle_error_and_exit, Result},
};
use std::{env, time};

fn disable_htslib_logging() {
    if env::var_os("SNVLINK_ENABLE_HTSLIB_LOGGING").is_some() {
        log::debug!("SNVLINK_ENABLE_HTSLIB_LOGGING is set, keeping htslib logging enabled");
        return;
    }
    unsafe {
        use rust_htslib::htslib::{htsLogLevel_HTS_LOG_OFF, hts_set_log_level};
        hts_set_log_level(htsLogLevel_HTS_LOG_OFF);
    }
}

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    disable_htslib_logging();
    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Call(args) => {
            log::trace!("Call arguments: {:#?}", args);
            args.preflight()?;
            call::call(args)?
        }
        Command::Link(args) => {
            log::trace!("Link arguments: {:#?}", args);
            args.preflight()?;
            link::link(args)?
        }
    }

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
