use clap::Parser;
use gpx_editor::{Settings, logging, run};
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::setup_logging();
    let settings = Settings::parse();
    tracing::debug!("{:?}", settings);

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{:?}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
