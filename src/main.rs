//! xsea - build Node.js single executable applications for many targets.
//!
//! This binary fetches matching Node.js runtimes, injects one application
//! payload into each of them and writes one executable per target.

use std::process;

#[tokio::main]
async fn main() {
    // Run CLI and get exit code
    let exit_code = match xsea::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
