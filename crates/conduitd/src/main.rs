use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match conduitd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed when bootstrap fails.
            let _ = writeln!(io::stderr().lock(), "conduitd: {error}");
            ExitCode::FAILURE
        }
    }
}
