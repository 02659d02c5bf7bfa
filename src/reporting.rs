//! Types for reporting non-fatal issues of a run to the user.
//!
//! Operations that may silently change the data (e.g. a duplicate feature id
//! overwriting an earlier value) do not log by themselves; they record a
//! [`Diagnostic`] in a [`Report`] that is returned together with their result.
//! The caller decides what to do with it (the command line tool logs every
//! entry as a warning).

use tracing::warn;

/// A single non-fatal issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A feature id occurred more than once in one table and the later value
    /// replaced the earlier one.
    DuplicateFeature { feature: String, column: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateFeature { feature, column } => write!(
                f,
                "duplicate value for row {} in {}, will overwrite previous value",
                feature, column
            ),
        }
    }
}

/// The collected diagnostics of a run, in the order they were raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: Diagnostic) {
        self.entries.push(issue)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Logs every entry as a warning.
    pub fn log(&self) {
        for entry in &self.entries {
            warn!("{}", entry);
        }
    }
}

/// The value produced by an operation together with its [`Report`].
#[derive(Debug)]
pub struct CommandOutput<U> {
    pub value: U,
    pub report: Report,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }
}
