use std::path::PathBuf;

use clap::Parser;

use stratus_bootstrap::journal::Journal;
use stratus_bootstrap::runner::ShellRunner;
use stratus_bootstrap::{Bootstrap, DEFAULT_LOCK_PATH, DEFAULT_LOG_PATH, DEFAULT_PAGE_PATH};

/// First-boot host setup: update the OS, install Apache, publish a static
/// page and start the service. Safe to invoke again: a marker file makes
/// later runs no-ops.
#[derive(Parser)]
#[command(name = "stratus-bootstrap")]
struct Cli {
    /// Log file path
    #[arg(default_value = DEFAULT_LOG_PATH)]
    log_file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let journal = match Journal::open(&cli.log_file) {
        Ok(journal) => journal,
        Err(e) => {
            eprintln!("failed to open log file {}: {}", cli.log_file.display(), e);
            std::process::exit(1);
        }
    };

    let mut bootstrap = Bootstrap::new(
        ShellRunner,
        journal,
        PathBuf::from(DEFAULT_LOCK_PATH),
        PathBuf::from(DEFAULT_PAGE_PATH),
    );

    if let Err(e) = bootstrap.run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
