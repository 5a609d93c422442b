//! Structured output of a snippet run.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// `console.log`, `console.trace`, `console.table`, `print`
    Log,
    /// `console.info`, `console.time*`, `console.clear`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`, failed assertions and caught errors
    Error,
    /// The value the snippet evaluated to
    Result,
}

impl OutputKind {
    /// Lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Result => "result",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line (or block) of snippet output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub kind: OutputKind,
    pub text: String,
}

impl OutputRecord {
    pub fn new(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn log(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Log, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Info, text)
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Warn, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Error, text)
    }

    pub fn result(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Result, text)
    }
}

/// Category prefixed to caught error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Syntax,
    Runtime,
    Memory,
    Timeout,
    Sandbox,
    Assertion,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Runtime => "RuntimeError",
            Self::Memory => "MemoryError",
            Self::Timeout => "TimeoutError",
            Self::Sandbox => "SandboxError",
            Self::Assertion => "AssertionError",
        }
    }

    /// Formats `message` as `<Category>: <message>`.
    pub fn describe(self, message: &str) -> String {
        format!("{}: {}", self.as_str(), message)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one snippet run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the snippet ran to completion without a caught error.
    pub success: bool,
    /// Records in emission order.
    pub records: Vec<OutputRecord>,
    /// Wall-clock time from invocation to completion or abort.
    pub duration: Duration,
    /// Description of the error that ended the run, if any.
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A completed run.
    pub fn completed(records: Vec<OutputRecord>, duration: Duration) -> Self {
        Self {
            success: true,
            records,
            duration,
            error: None,
        }
    }

    /// A run that ended with a caught error.
    ///
    /// The error is appended as the final `error` record.
    pub fn failed(
        mut records: Vec<OutputRecord>,
        category: ErrorCategory,
        message: &str,
        duration: Duration,
    ) -> Self {
        let description = category.describe(message);
        records.push(OutputRecord::error(description.clone()));
        Self {
            success: false,
            records,
            duration,
            error: Some(description),
        }
    }

    /// The `result` record, if the snippet produced a value.
    pub fn result_record(&self) -> Option<&OutputRecord> {
        self.records.iter().find(|r| r.kind == OutputKind::Result)
    }

    /// Records of the given kind, in order.
    pub fn records_of(&self, kind: OutputKind) -> impl Iterator<Item = &OutputRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Whether the run was aborted by its deadline.
    pub fn timed_out(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|e| e.starts_with(ErrorCategory::Timeout.as_str()))
    }

    /// Duration in whole milliseconds.
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}
