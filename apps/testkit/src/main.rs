mod cli;

use std::process::ExitCode;
use testkit_foundation::TestKitError;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            if let Some(cause) = e.chain().find_map(|c| c.downcast_ref::<TestKitError>()) {
                tracing::error!(kind = cause.kind(), "Command failed");
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
