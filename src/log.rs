//! Raw traffic echo.
//!
//! Every line sent or received is traced at `trace` level. When
//! `PrintOutput` or `LogFile` is configured, it is also written to
//! stdout or appended to the file with a local timestamp. Inbound lines
//! are marked `<-`, outbound lines `->`. SASL payloads never appear in
//! clear.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{trace, warn};

use crate::command::Command;

#[derive(Debug, Default)]
pub struct TrafficLog {
    print_output: bool,
    file: Option<File>,
}

impl TrafficLog {
    /// A sink that only traces.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A failure to open `log_file` is reported and the file is skipped.
    pub fn new(print_output: bool, log_file: Option<&Path>) -> Self {
        let file = log_file.and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| warn!(path = %path.display(), "cannot open traffic log: {}", e))
                .ok()
        });
        Self { print_output, file }
    }

    pub fn is_enabled(&self) -> bool {
        self.print_output || self.file.is_some()
    }

    pub fn inbound(&mut self, server: &str, line: &str) {
        trace!(server, "<- {}", line);
        self.write("<-", line);
    }

    pub fn outbound(&mut self, server: &str, command: &Command) {
        let line = if command.is_sensitive() {
            format!("{} ****", command.name())
        } else {
            command.to_string()
        };
        trace!(server, "-> {}", line);
        self.write("->", &line);
    }

    fn write(&mut self, marker: &str, line: &str) {
        if self.print_output {
            println!("{} {}", marker, line);
        }
        if let Some(file) = &mut self.file {
            let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            if let Err(e) = writeln!(file, "[{}] {} {}", stamp, marker, line) {
                warn!("traffic log write failed, disabling: {}", e);
                self.file = None;
            }
        }
    }
}
