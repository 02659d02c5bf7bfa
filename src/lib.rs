//! collect-columns merges per-sample feature tables (e.g. the gene counts produced by
//! HTSeq-count or the abundances produced by StringTie) into one table keyed by the
//! feature id, and can add columns with attributes collected from a GTF/GFF file.
//!
//! The work is split into three steps, each usable on its own:
//!
//! 1. [`MergedTable::from_tables`] outer-joins one value column of every input table
//!    on the feature ids, returning non-fatal issues (duplicate ids) in a [`Report`].
//! 2. [`annotate::annotate_from_file`] collects the values of the requested attributes
//!    for every row from the records of a GTF/GFF file.
//! 3. [`writer::write_table`] writes the result as delimited text.
//!
//! [`run`] chains the three steps according to a [`CollectOptions`].

pub mod annotate;
pub mod cli;
pub mod collect_utils;
pub mod errors;
pub mod merged_table;
pub mod options;
pub mod reader;
pub mod reporting;
pub mod writer;

pub use errors::CollectError;
pub use merged_table::{MergedTable, Value};
pub use options::{AnnotationOptions, CollectOptions, TableLayout, TableSource};
pub use reporting::{Diagnostic, Report};

/// Merges the tables, collects the additional attributes and writes the output, as
/// configured by `opts`. Nothing is written if any step fails.
///
/// Returns the [`Report`] of the non-fatal issues encountered.
pub fn run(opts: &CollectOptions) -> anyhow::Result<Report> {
    let merged = MergedTable::from_tables(&opts.tables, &opts.layout, opts.sum_on_duplicate)?;
    let table = merged.value;

    let annotations = match &opts.annotation {
        Some(ao) => Some(annotate::annotate_from_file(
            &table,
            &ao.gtf,
            &ao.feature_attribute,
            &ao.attributes,
        )?),
        None => None,
    };

    writer::write_table(
        &opts.output,
        &table,
        annotations.as_ref(),
        opts.layout.separator,
    )?;
    Ok(merged.report)
}
