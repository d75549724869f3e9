//! confparse - INI-style config file tool

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = confparse::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
