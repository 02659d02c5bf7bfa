//! The immutable configuration of a collect run.
//!
//! A [`CollectOptions`] is constructed once, either from the command line (see
//! [`crate::cli`]) or directly by a library caller, and is validated on
//! construction. Every configuration error is detected here, before any input
//! file is opened.

use crate::collect_utils::{unique_column_names, FEATURE_COLUMN};
use crate::errors::CollectError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Describes how the values of interest are laid out in each input table.
///
/// # Fields
///
/// * `feature_column`: The zero-based position of the column holding the feature ids.
/// * `value_column`: The zero-based position of the column holding the values of interest.
///   It may be equal to `feature_column`.
/// * `separator`: The field separator of the input tables, also used for the output table.
/// * `has_header`: Whether the first row of each table is a header that should be skipped.
pub struct TableLayout {
    pub feature_column: usize,
    pub value_column: usize,
    pub separator: u8,
    pub has_header: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            feature_column: 0,
            value_column: 1,
            separator: b'\t',
            has_header: false,
        }
    }
}

impl TableLayout {
    /// The number of fields a row must have so that both columns exist.
    pub fn min_fields(&self) -> usize {
        self.feature_column.max(self.value_column) + 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One input table together with the name of the sample column it contributes.
pub struct TableSource {
    pub name: String,
    pub path: PathBuf,
}

impl TableSource {
    pub fn new<T: Into<PathBuf>>(name: impl Into<String>, path: T) -> TableSource {
        TableSource {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Creates a [`TableSource`] named after the file name of the table.
    pub fn from_path<T: AsRef<Path>>(path: T) -> Result<TableSource, CollectError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| CollectError::NoSampleName(path.to_path_buf()))?;
        Ok(TableSource::new(name, path))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Where and what to collect from a GTF/GFF file.
///
/// # Fields
///
/// * `gtf`: The path to the GTF or GFF file.
/// * `feature_attribute`: The attribute used to match records to the rows of the merged table.
/// * `attributes`: The attributes that are collected, in the order their columns appear.
pub struct AnnotationOptions {
    pub gtf: PathBuf,
    pub feature_attribute: String,
    pub attributes: Vec<String>,
}

impl AnnotationOptions {
    /// Creates a new [`AnnotationOptions`]. Attribute names that are requested more
    /// than once are kept only at their first position.
    pub fn new<T: Into<PathBuf>>(
        gtf: T,
        feature_attribute: impl Into<String>,
        attributes: Vec<String>,
    ) -> AnnotationOptions {
        let mut seen = HashSet::with_capacity(attributes.len());
        let mut unique = Vec::with_capacity(attributes.len());
        for attr in attributes {
            if seen.insert(attr.clone()) {
                unique.push(attr);
            } else {
                warn!("attribute '{}' was requested more than once; it is collected once", attr);
            }
        }
        AnnotationOptions {
            gtf: gtf.into(),
            feature_attribute: feature_attribute.into(),
            attributes: unique,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// The complete, validated configuration of a run.
///
/// # Fields
///
/// * `output`: The path the merged table is written to (`-` for standard output).
/// * `tables`: The input tables, in the order their columns appear in the output.
///   Sample names are unique.
/// * `layout`: The layout shared by all input tables.
/// * `sum_on_duplicate`: Whether values of a feature id occurring more than once in
///   a table are summed (instead of the last one being kept).
/// * `annotation`: The attributes to collect from a GTF/GFF file, if any.
pub struct CollectOptions {
    pub output: PathBuf,
    pub tables: Vec<TableSource>,
    pub layout: TableLayout,
    pub sum_on_duplicate: bool,
    pub annotation: Option<AnnotationOptions>,
}

impl CollectOptions {
    /// Creates a new [`CollectOptions`] instance and validates it.
    ///
    /// ### Arguments
    ///
    /// * `output`: The output path.
    /// * `tables`: The paths of the tables to be merged.
    /// * `names`: The sample names corresponding to `tables`. If `None`, the file names
    ///   of the tables are used. Repeated names are made unique with a numeric suffix.
    /// * `layout`: The column layout of the tables.
    /// * `sum_on_duplicate`: The duplicate feature id policy.
    /// * `attributes`: The attributes to collect from `gtf`.
    /// * `gtf`: The GTF/GFF file. Required if `attributes` is given, ignored otherwise.
    /// * `feature_attribute`: The attribute matching GTF/GFF records with table rows.
    ///
    /// ### Returns
    ///
    /// A [`CollectError`] if no tables are given, if the number of names differs from
    /// the number of tables, if attributes are requested without a GTF/GFF file, or if
    /// two output columns would share a name.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        output: PathBuf,
        tables: Vec<PathBuf>,
        names: Option<Vec<String>>,
        layout: TableLayout,
        sum_on_duplicate: bool,
        attributes: Option<Vec<String>>,
        gtf: Option<PathBuf>,
        feature_attribute: String,
    ) -> Result<CollectOptions, CollectError> {
        if tables.is_empty() {
            return Err(CollectError::NoTables);
        }

        let names = match names {
            Some(names) => {
                if names.len() != tables.len() {
                    return Err(CollectError::NameCountMismatch {
                        names: names.len(),
                        tables: tables.len(),
                    });
                }
                names
            }
            None => tables
                .iter()
                .map(|p| TableSource::from_path(p).map(|s| s.name))
                .collect::<Result<Vec<String>, CollectError>>()?,
        };

        let names = unique_column_names(names);
        let tables: Vec<TableSource> = names
            .into_iter()
            .zip(tables)
            .map(|(name, path)| TableSource::new(name, path))
            .collect();

        let annotation = match (attributes, gtf) {
            (Some(attributes), Some(gtf)) => {
                Some(AnnotationOptions::new(gtf, feature_attribute, attributes))
            }
            (Some(_), None) => return Err(CollectError::MissingAnnotationSource),
            (None, _) => None,
        };

        let opts = CollectOptions {
            output,
            tables,
            layout,
            sum_on_duplicate,
            annotation,
        };
        opts.validate_columns()?;
        Ok(opts)
    }

    /// The sample column names, in output order.
    pub fn sample_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// The attribute column names, in output order. Empty if nothing is annotated.
    pub fn attribute_names(&self) -> &[String] {
        match &self.annotation {
            Some(ao) => &ao.attributes,
            None => &[],
        }
    }

    /// Checks that the feature column, the attribute columns and the sample columns
    /// all have distinct names.
    fn validate_columns(&self) -> Result<(), CollectError> {
        let mut seen = HashSet::new();
        seen.insert(FEATURE_COLUMN);
        let samples = self.sample_names();
        for name in self.attribute_names().iter().chain(samples.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(CollectError::ColumnCollision(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(p: &[&str]) -> Vec<PathBuf> {
        p.iter().map(PathBuf::from).collect()
    }

    fn build(
        tables: &[&str],
        names: Option<Vec<&str>>,
        attributes: Option<Vec<&str>>,
        gtf: Option<&str>,
    ) -> Result<CollectOptions, CollectError> {
        CollectOptions::new(
            PathBuf::from("out.tsv"),
            paths(tables),
            names.map(|n| n.into_iter().map(String::from).collect()),
            TableLayout::default(),
            false,
            attributes.map(|a| a.into_iter().map(String::from).collect()),
            gtf.map(PathBuf::from),
            String::from("gene_id"),
        )
    }

    #[test]
    fn test_default_names() {
        let opts = build(&["data/sample1.tsv", "other/sample2.tsv"], None, None, None).unwrap();
        assert_eq!(opts.sample_names(), vec!["sample1.tsv", "sample2.tsv"]);
        assert!(opts.annotation.is_none());
        assert_eq!(opts.layout.min_fields(), 2);
    }

    #[test]
    fn test_repeated_file_names_are_suffixed() {
        let opts = build(&["a/counts.tsv", "b/counts.tsv"], None, None, None).unwrap();
        assert_eq!(opts.sample_names(), vec!["counts.tsv", "counts.tsv.1"]);
    }

    #[test]
    fn test_name_count_mismatch() {
        let err = build(&["a.tsv", "b.tsv"], Some(vec!["x"]), None, None).unwrap_err();
        assert!(matches!(
            err,
            CollectError::NameCountMismatch {
                names: 1,
                tables: 2
            }
        ));
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_attributes_require_gtf() {
        let err = build(&["a.tsv"], None, Some(vec!["gene_name"]), None).unwrap_err();
        assert!(matches!(err, CollectError::MissingAnnotationSource));

        // a gtf without attributes is ignored
        let opts = build(&["a.tsv"], None, None, Some("genes.gtf")).unwrap();
        assert!(opts.annotation.is_none());
    }

    #[test]
    fn test_repeated_attributes_are_collapsed() {
        let opts = build(
            &["a.tsv"],
            Some(vec!["s1"]),
            Some(vec!["gene_name", "ref_gene_id", "gene_name"]),
            Some("genes.gtf"),
        )
        .unwrap();
        assert_eq!(opts.attribute_names(), &["gene_name", "ref_gene_id"]);
    }

    #[test]
    fn test_column_collisions() {
        let err = build(
            &["a.tsv"],
            Some(vec!["gene_name"]),
            Some(vec!["gene_name"]),
            Some("genes.gtf"),
        )
        .unwrap_err();
        assert!(matches!(err, CollectError::ColumnCollision(ref c) if c == "gene_name"));

        let err = build(&["a.tsv"], Some(vec!["feature"]), None, None).unwrap_err();
        assert!(matches!(err, CollectError::ColumnCollision(ref c) if c == "feature"));
    }

    #[test]
    fn test_no_tables() {
        let err = build(&[], None, None, None).unwrap_err();
        assert!(matches!(err, CollectError::NoTables));
    }
}
