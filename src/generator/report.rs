use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::descriptor::DescriptorKind;
use crate::error::ConvertError;

/// What happened to one descriptor
#[derive(Debug)]
pub enum FileStatus {
    /// Rendered and written to this path
    Written(PathBuf),
    /// Rendered only (dry run); would have been written to this path
    Planned(PathBuf),
    /// Reflection, rendering or writing failed
    Failed(ConvertError),
}

/// Outcome of processing one descriptor
#[derive(Debug)]
pub struct FileOutcome {
    /// Position in the discovery sequence
    pub index: usize,
    /// Descriptor kind
    pub kind: DescriptorKind,
    /// Generated class name
    pub short_name: String,
    /// Source file the descriptor was reflected from
    pub source_file: PathBuf,
    /// Time spent reflecting, rendering and writing
    pub duration: Duration,
    /// Time spent in the template renderer; `None` if rendering was not reached or failed
    pub render_duration: Option<Duration>,
    /// Result
    pub status: FileStatus,
}

impl FileOutcome {
    /// Whether the descriptor was rendered successfully
    pub fn is_success(&self) -> bool {
        !matches!(self.status, FileStatus::Failed(_))
    }

    /// The per-file report line
    pub fn line(&self) -> String {
        match &self.status {
            FileStatus::Written(path) => format!("File saved to: {}", path.display()),
            FileStatus::Planned(path) => format!("File would be saved to: {}", path.display()),
            FileStatus::Failed(err) => format!(
                "Failed to convert {}: {}: {}",
                self.source_file.display(),
                err.kind_name(),
                err
            ),
        }
    }
}

/// Aggregated result of a batch run
///
/// Outcomes are kept in discovery order whatever the number of workers was.
#[derive(Debug)]
pub struct RunReport {
    /// Number of descriptors discovered across the three roots
    pub discovered: usize,
    /// Files skipped because their name is not a usable class name
    pub skipped: usize,
    /// One outcome per descriptor, sorted by index
    pub outcomes: Vec<FileOutcome>,
    /// Local time the run started
    pub started_at: NaiveDateTime,
    /// Wall-clock duration of the whole run
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of descriptors rendered (and written, unless dry run)
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of descriptors that failed
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Failed outcomes in discovery order
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Per-file lines in discovery order
    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(FileOutcome::line).collect()
    }

    /// Final summary line
    pub fn summary_line(&self) -> String {
        format!(
            "Converter finished in {:.4} seconds and generated {} classes ({} failed)",
            self.elapsed.as_secs_f64(),
            self.succeeded(),
            self.failed()
        )
    }

    /// Serializable totals for machine-readable output
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            discovered: self.discovered,
            skipped: self.skipped,
            succeeded: self.succeeded(),
            failed: self.failed(),
            started_at: self.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            elapsed_seconds: self.elapsed.as_secs_f64(),
            files: self
                .outcomes
                .iter()
                .map(|o| FileSummary {
                    kind: o.kind,
                    class: o.short_name.clone(),
                    source: o.source_file.display().to_string(),
                    output: match &o.status {
                        FileStatus::Written(p) | FileStatus::Planned(p) => {
                            Some(p.display().to_string())
                        }
                        FileStatus::Failed(_) => None,
                    },
                    error: match &o.status {
                        FileStatus::Failed(e) => Some(format!("{}: {}", e.kind_name(), e)),
                        _ => None,
                    },
                    duration_ms: o.duration.as_secs_f64() * 1000.0,
                    render_ms: o.render_duration.map(|d| d.as_secs_f64() * 1000.0),
                })
                .collect(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        write!(f, "{}", self.summary_line())
    }
}

/// Machine-readable run totals
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Descriptors discovered
    pub discovered: usize,
    /// Files skipped during scanning
    pub skipped: usize,
    /// Descriptors converted
    pub succeeded: usize,
    /// Descriptors that failed
    pub failed: usize,
    /// Start time
    pub started_at: String,
    /// Wall-clock seconds
    pub elapsed_seconds: f64,
    /// Per-file details in discovery order
    pub files: Vec<FileSummary>,
}

/// Machine-readable outcome of one descriptor
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    /// Descriptor kind
    pub kind: DescriptorKind,
    /// Class name
    pub class: String,
    /// Source file
    pub source: String,
    /// Output file, if rendered
    pub output: Option<String>,
    /// Error label and message, if failed
    pub error: Option<String>,
    /// Reflect, render and write time in milliseconds
    pub duration_ms: f64,
    /// Render time in milliseconds, if rendering succeeded
    pub render_ms: Option<f64>,
}
