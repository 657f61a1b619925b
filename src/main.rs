use std::process::ExitCode;

use clap::Parser;
use routekit::cli::{run_cli, Cli};
use routekit::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: {e:#}");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run_cli(cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
