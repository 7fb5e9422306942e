//! Timestamped run journal writing to a log file and the system logger.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use chrono::Local;

/// Dual-sink journal for one bootstrap run.
///
/// Every message lands in the log file and, when a tag is set, in the system
/// logger via `logger(1)`. Successive identical messages are written once.
pub struct Journal {
    file: File,
    syslog_tag: Option<String>,
    last_message: Option<String>,
}

impl Journal {
    /// Open (or create) the log file and journal to it and to the system
    /// logger under the default tag.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            syslog_tag: Some("stratus-bootstrap".to_string()),
            last_message: None,
        })
    }

    /// Disable or retag the system logger sink.
    pub fn with_syslog_tag(mut self, tag: Option<&str>) -> Self {
        self.syslog_tag = tag.map(String::from);
        self
    }

    /// Write one timestamped message. A message identical to the previous
    /// one is dropped.
    pub fn log(&mut self, message: &str) -> std::io::Result<()> {
        if self.last_message.as_deref() == Some(message) {
            return Ok(());
        }

        let line = format!("{} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;

        if let Some(tag) = &self.syslog_tag {
            // Best effort: minimal images may not ship logger(1).
            let _ = Command::new("logger")
                .arg("-t")
                .arg(tag)
                .arg(message)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }

        self.last_message = Some(message.to_string());
        Ok(())
    }
}
