//! nextup - Local-first task outliner with next-up ranking

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = nextup::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
