//! changelog - maintain a structured project changelog

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = changelog::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
