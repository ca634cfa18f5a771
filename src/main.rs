//! storage-sweep - Delete tables and blob containers from the local storage emulator
//!
//! This is the binary entry point. All logic lives in the library.

use clap::Parser;
use storage_sweep::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // Logs go to a file; a failure here must not block the sweep
    if let Err(e) = sweep_core::logging::init() {
        eprintln!("Warning: file logging unavailable: {}", e);
    }

    let code = storage_sweep::run(args).await;
    tracing::info!("storage-sweep exiting with code {}", code);
    std::process::exit(code);
}
