use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use delta_deploy::cli::RootArgs;
use delta_deploy::workflow;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "DELTA_DEPLOY_LOG";

fn main() -> ExitCode {
    let args = match RootArgs::try_parse() {
        Ok(args) => args,
        Err(err) if err.kind() == ErrorKind::UnknownArgument => {
            let _ = err.print();
            eprintln!("\n{}", RootArgs::command().render_long_help());
            return ExitCode::from(2);
        }
        Err(err) => err.exit(),
    };
    init_tracing(args.verbose);

    match workflow::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
