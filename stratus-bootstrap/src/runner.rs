//! Guarded command execution.

use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
}

/// Executes one command and reports whether it succeeded. The seam that
/// keeps the bootstrap flow testable without mutating the host.
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<(), RunnerError>;
}

/// Runs commands on the host, treating any nonzero exit status as failure.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<(), RunnerError> {
        let command = format!("{} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| RunnerError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(RunnerError::Failed { command, status })
        }
    }
}
