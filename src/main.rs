//! mailforge-release - release pipeline for the MailForge desktop client.
//!
//! Lints sources, stages the packaged application, wraps it into
//! platform installers, and publishes artifacts to the object store.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match mailforge_release::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
