//! The [`CollectError`] `enum` definition and error messages.
//!
//! Public functions of this crate return [`anyhow::Result`]; the conditions a
//! caller may want to react to are raised as a [`CollectError`] inside the
//! [`anyhow::Error`] and can be recovered with [`anyhow::Error::downcast_ref`].

use std::path::PathBuf;
use thiserror::Error;

/// The set of typed errors reported to the user.
#[derive(Debug, Error)]
pub enum CollectError {
    // configuration related errors, raised before any file is opened
    #[error("no input tables were given")]
    NoTables,
    #[error(
        "{names} sample name(s) were given for {tables} table(s); the number of names must equal the number of tables"
    )]
    NameCountMismatch { names: usize, tables: usize },
    #[error("the following argument is required if -a is specified: -g")]
    MissingAnnotationSource,
    #[error("the separator must be a single ASCII character, got {0:?}")]
    InvalidSeparator(String),
    #[error("the column name '{0}' would appear more than once in the output table")]
    ColumnCollision(String),
    #[error("could not determine a sample name from the table path {0:?}")]
    NoSampleName(PathBuf),

    // table format errors
    #[error("{source_name}: line {line} has {found} field(s), but column {needed} was requested")]
    TooFewColumns {
        source_name: String,
        line: u64,
        found: usize,
        needed: usize,
    },
    #[error(
        "cannot sum the duplicate values for row {feature} in {column}: '{value}' is not a number"
    )]
    NonNumericValue {
        feature: String,
        column: String,
        value: String,
    },

    // annotation source errors
    #[error("could not determine whether {0:?} is a GTF or a GFF file")]
    UnknownAnnotationFormat(PathBuf),
}

impl CollectError {
    /// Returns `true` for the errors that are detected while validating the
    /// configuration, i.e. before any input is read.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CollectError::NoTables
                | CollectError::NameCountMismatch { .. }
                | CollectError::MissingAnnotationSource
                | CollectError::InvalidSeparator(_)
                | CollectError::ColumnCollision(_)
                | CollectError::NoSampleName(_)
        )
    }
}
