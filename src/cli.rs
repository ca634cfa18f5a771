//! Command-line surface: arguments, user-facing output and exit codes

use std::path::PathBuf;

use clap::Parser;
use sweep_app::{
    load_settings, DeletionStatus, EmulatorSweeper, ResourceKind, SweepReport, SweepRequest,
    CONFIG_FILENAME,
};
use sweep_core::prelude::*;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_REQUIREMENTS_NOT_MET: i32 = 1;
pub const EXIT_EMULATOR_FAILURE: i32 = 2;
pub const EXIT_CONFIG_ERROR: i32 = 3;

/// storage-sweep - Delete tables and blob containers from the local storage emulator
#[derive(Parser, Debug)]
#[command(name = "storage-sweep")]
#[command(
    about = "Ensure the local storage emulator is running, then delete tables and blob containers",
    long_about = None
)]
pub struct Args {
    /// Tables to delete (comma- or space-separated)
    #[arg(short, long, value_name = "LIST")]
    pub tables: Option<String>,

    /// Blob containers to delete (comma- or space-separated)
    #[arg(short, long, value_name = "LIST")]
    pub blobs: Option<String>,

    /// Only print errors and the final summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Stop the emulator once the sweep completes
    #[arg(long)]
    pub stop_after: bool,

    /// Settings file
    #[arg(short, long, value_name = "PATH", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,
}

impl Args {
    pub fn request(&self) -> SweepRequest {
        SweepRequest::new(self.tables.as_deref(), self.blobs.as_deref())
            .with_stop_after(self.stop_after)
    }
}

/// Process exit code for a sweep that aborted with `err`
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::RequirementsNotMet { .. } => EXIT_REQUIREMENTS_NOT_MET,
        Error::Config { .. } => EXIT_CONFIG_ERROR,
        _ => EXIT_EMULATOR_FAILURE,
    }
}

/// Run one sweep and return the process exit code
pub async fn run(args: Args) -> i32 {
    let settings = load_settings(&args.config);
    let request = args.request();
    info!("Sweep request: {:?}", request);

    if request.is_empty() && !args.quiet {
        eprintln!("No tables or blob containers given; only checking the storage emulator.");
    }

    let mut sweeper = match EmulatorSweeper::from_settings(&settings) {
        Ok(sweeper) => sweeper,
        Err(e) => {
            error!("Invalid settings: {}", e);
            eprintln!("❌ {}", e);
            eprintln!("   Check {}", args.config.display());
            return exit_code(&e);
        }
    };

    match sweeper.run(&request).await {
        Ok(report) => {
            print_report(&report, args.quiet);
            match report.stop_failure() {
                Some(message) => {
                    eprintln!("❌ {}", message);
                    EXIT_EMULATOR_FAILURE
                }
                None => EXIT_SUCCESS,
            }
        }
        Err(e) => {
            error!("Sweep aborted: {:?}", e);
            match e {
                Error::RequirementsNotMet { .. } => {
                    eprintln!("❌ Requirements not met");
                    eprintln!("   {}", e);
                    eprintln!(
                        "   Emulator looked up at: {}",
                        settings.emulator.path.display()
                    );
                }
                _ => {
                    eprintln!("❌ {}", e);
                }
            }
            exit_code(&e)
        }
    }
}

fn print_report(report: &SweepReport, quiet: bool) {
    for kind in [ResourceKind::Table, ResourceKind::Container] {
        if report.of_kind(kind).next().is_none() {
            continue;
        }

        for outcome in report.of_kind(kind) {
            let failed = matches!(outcome.status, DeletionStatus::Failed(_));
            if failed {
                eprintln!("   {}", outcome);
            } else if !quiet {
                println!("   {}", outcome);
            }
        }
        println!("{}", report.summary(kind));
    }
}
