//! Writing the merged (and possibly annotated) table.

use crate::annotate::Annotations;
use crate::collect_utils::FEATURE_COLUMN;
use crate::merged_table::MergedTable;
use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use polars::prelude::*;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Builds the output [`DataFrame`]: the `feature` column, then one column per
/// collected attribute (in the requested order) and then one column per sample
/// (in input order). Missing values are nulls.
pub fn to_dataframe(table: &MergedTable, annotations: Option<&Annotations>) -> anyhow::Result<DataFrame> {
    let mut columns: Vec<Series> = Vec::with_capacity(1 + table.n_samples());
    columns.push(Series::new(
        FEATURE_COLUMN,
        table.features().cloned().collect::<Vec<String>>(),
    ));

    if let Some(ann) = annotations {
        for (idx, attr) in ann.attributes().iter().enumerate() {
            columns.push(Series::new(attr.as_str(), ann.column(table, idx)));
        }
    }

    for (idx, sample) in table.samples().iter().enumerate() {
        columns.push(Series::new(sample.as_str(), table.column(idx)));
    }

    let df = DataFrame::new(columns)?;
    Ok(df)
}

/// Writes `df` as delimited text with a header line to `w`. Nulls are written as
/// empty fields; fields containing the separator, a quote or a line break are quoted.
pub fn write_dataframe<W: Write>(df: &mut DataFrame, w: &mut W, separator: u8) -> anyhow::Result<()> {
    CsvWriter::new(w)
        .has_header(true)
        .with_separator(separator)
        .with_null_value(String::new())
        .finish(df)?;
    Ok(())
}

/// Writes the table to `file_path`.
///
/// The table is first written to a temporary file next to `file_path`, which is
/// renamed to `file_path` once everything has been written, so an error never
/// leaves a partial output behind. If `file_path` has a `.gz` extension the
/// output is gzip compressed. If `file_path` is `-` the table is written to
/// standard output.
pub fn write_table<T: AsRef<Path>>(
    file_path: T,
    table: &MergedTable,
    annotations: Option<&Annotations>,
    separator: u8,
) -> anyhow::Result<()> {
    let file_path = file_path.as_ref();
    let mut df = to_dataframe(table, annotations)?;

    if file_path == Path::new("-") {
        let stdout = std::io::stdout();
        let mut w = BufWriter::new(stdout.lock());
        write_dataframe(&mut df, &mut w, separator)?;
        w.flush()?;
        return Ok(());
    }

    // create the folder if it doesn't exist
    let parent = match file_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| {
        format!(
            "Could not create the parent directory of the output file {:?}",
            file_path
        )
    })?;

    // the temporary file becomes the output, so it gets the mode of a plainly created file
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder
        .tempfile_in(parent)
        .with_context(|| format!("Could not create a temporary file in {:?}", parent))?;
    {
        let is_gzip = file_path.extension().map_or(false, |ext| ext == "gz");
        let file = BufWriter::with_capacity(4194304, tmp.as_file_mut());
        if is_gzip {
            let mut enc = GzEncoder::new(file, Compression::default());
            write_dataframe(&mut df, &mut enc, separator)?;
            enc.finish()?.flush()?;
        } else {
            let mut file = file;
            write_dataframe(&mut df, &mut file, separator)?;
            file.flush()?;
        }
    }
    tmp.persist(file_path)
        .with_context(|| format!("Could not write the output file {:?}", file_path))?;

    info!(
        "wrote {} rows and {} columns to {:?}",
        df.height(),
        df.width(),
        file_path
    );
    Ok(())
}
