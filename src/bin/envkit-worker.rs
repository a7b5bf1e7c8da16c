//! Serves one built-in environment over stdin/stdout for a parent process.

use std::process::ExitCode;

fn main() -> ExitCode {
    envkit::logging::init();
    match envkit::runtime::run_worker() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "environment worker failed");
            ExitCode::FAILURE
        }
    }
}
