//! Run-once host bootstrap.
//!
//! A linear sequence of guarded steps: update the OS, install Apache,
//! publish a static page, enable and start the service. A marker file
//! written at the start guards against re-entry; each step is checked by
//! exit status and the first failure aborts the whole run.

pub mod journal;
pub mod runner;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::journal::Journal;
use crate::runner::{CommandRunner, RunnerError};

/// Default log file path.
pub const DEFAULT_LOG_PATH: &str = "/var/log/stratus-bootstrap.log";
/// Marker file guarding against a second run.
pub const DEFAULT_LOCK_PATH: &str = "/var/run/stratus-bootstrap.lock";
/// Where Apache serves the static page from.
pub const DEFAULT_PAGE_PATH: &str = "/var/www/html/index.html";

const PAGE: &str = "<!DOCTYPE html>\n<html>\n  <head><title>Welcome</title></head>\n  <body>\n    <h1>It works!</h1>\n    <p>This host was provisioned automatically.</p>\n  </body>\n</html>\n";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] RunnerError),
}

impl BootstrapError {
    fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// All steps ran to completion.
    Completed,
    /// The marker file was already present; nothing was touched.
    AlreadyProvisioned,
}

/// The bootstrap flow with its filesystem anchors.
pub struct Bootstrap<R: CommandRunner> {
    runner: R,
    journal: Journal,
    lock_path: PathBuf,
    page_path: PathBuf,
}

impl<R: CommandRunner> Bootstrap<R> {
    pub fn new(runner: R, journal: Journal, lock_path: PathBuf, page_path: PathBuf) -> Self {
        Self {
            runner,
            journal,
            lock_path,
            page_path,
        }
    }

    /// Run the whole sequence. Exit-status failures and I/O errors abort the
    /// run; a present marker file short-circuits it.
    pub fn run(&mut self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.lock_path.exists() {
            self.journal
                .log("bootstrap marker present, nothing to do")
                .map_err(BootstrapError::io("writing journal"))?;
            return Ok(BootstrapOutcome::AlreadyProvisioned);
        }

        self.write_marker()?;

        self.step("updating installed packages", "yum", &["update", "-y"])?;
        self.step("installing httpd", "yum", &["install", "-y", "httpd"])?;
        self.publish_page()?;
        self.step("enabling httpd", "systemctl", &["enable", "httpd"])?;
        self.step("starting httpd", "systemctl", &["start", "httpd"])?;

        self.journal
            .log("bootstrap finished")
            .map_err(BootstrapError::io("writing journal"))?;

        Ok(BootstrapOutcome::Completed)
    }

    // The marker stays in place after a failed run as well, so a crashed
    // bootstrap blocks retries until it is removed by hand.
    // TODO: drop the marker when a later step fails so a crashed run can retry.
    fn write_marker(&mut self) -> Result<(), BootstrapError> {
        let content = format!(
            "started {} pid {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            std::process::id()
        );
        fs::write(&self.lock_path, content).map_err(BootstrapError::io(format!(
            "writing marker {}",
            self.lock_path.display()
        )))?;
        self.journal
            .log("bootstrap starting")
            .map_err(BootstrapError::io("writing journal"))?;
        Ok(())
    }

    fn publish_page(&mut self) -> Result<(), BootstrapError> {
        self.journal
            .log("publishing static page")
            .map_err(BootstrapError::io("writing journal"))?;
        fs::write(&self.page_path, PAGE).map_err(BootstrapError::io(format!(
            "writing {}",
            self.page_path.display()
        )))?;
        Ok(())
    }

    fn step(
        &mut self,
        what: &str,
        program: &str,
        args: &[&str],
    ) -> Result<(), BootstrapError> {
        self.journal
            .log(what)
            .map_err(BootstrapError::io("writing journal"))?;

        match self.runner.run(program, args) {
            Ok(()) => {
                self.journal
                    .log(&format!("{}: done", what))
                    .map_err(BootstrapError::io("writing journal"))?;
                Ok(())
            }
            Err(e) => {
                self.journal
                    .log(&format!("{}: {}", what, e))
                    .map_err(BootstrapError::io("writing journal"))?;
                Err(e.into())
            }
        }
    }
}
