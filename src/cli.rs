//! The command line interface of `collect-columns`.

use crate::collect_utils::parse_separator;
use crate::options::{CollectOptions, TableLayout};
use clap::Parser;
use std::path::PathBuf;

const ABOUT: &str = "\
Retrieves a column from a set of tables and puts them into a single table.
Optionally, additional attributes may be retrieved from a GTF or GFF file, \
which will be added as additional columns in the merged table as well.";

#[derive(Parser, Debug)]
#[command(name = "collect-columns", version, about = ABOUT)]
pub struct Cli {
    /// The path the output will be written to (`-` for standard output).
    pub output: PathBuf,

    /// The tables to be merged.
    #[arg(required = true, num_args = 1..)]
    pub table: Vec<PathBuf>,

    /// The position of the column with the (unique) feature ids.
    #[arg(short = 'f', long, default_value_t = 0, value_name = "I")]
    pub feature_column: usize,

    /// The position of the column with the values of interest.
    #[arg(short = 'c', long, default_value_t = 1, value_name = "I", alias = "counts-column")]
    pub value_column: usize,

    /// The separator used in the tables. This will also be used in the output table.
    #[arg(short = 's', long, default_value = "\t", alias = "separator")]
    pub sep: String,

    /// The names of the samples corresponding to the tables (in the same order as
    /// the tables). These will be used as headers in the merged table. If not
    /// specified the basenames of the tables will be used.
    #[arg(short = 'n', long, num_args = 1.., value_name = "NAME")]
    pub names: Option<Vec<String>>,

    /// Whether or not the tables have a header.
    #[arg(short = 'H', long)]
    pub header: bool,

    /// Sum the values of a feature id occurring more than once in a table,
    /// instead of keeping the last one.
    #[arg(short = 'S', long = "sum-on-duplicate-id")]
    pub sum_on_duplicate_id: bool,

    /// A list of attributes which will be added to the merged table. These
    /// attributes will be retrieved from the GTF or GFF file specified with the
    /// -g option. Multiple values will be separated by a ';'. Requires -g to be
    /// specified.
    #[arg(short = 'a', long, num_args = 1.., value_name = "ATTR", requires = "gtf")]
    pub additional_attributes: Option<Vec<String>>,

    /// The GTF or GFF file from which the additional attributes (see -a) will be
    /// retrieved. Ignored if -a is not specified.
    #[arg(short = 'g', long, alias = "gff", value_name = "FILE")]
    pub gtf: Option<PathBuf>,

    /// The attribute from the GTF/GFF used for matching the feature records with
    /// the rows in the table. Ignored if -a is not specified.
    #[arg(short = 'F', long, default_value = "gene_id", value_name = "ATTR")]
    pub feature_attribute: String,

    /// Only log warnings and errors.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    /// Validates the arguments and converts them into a [`CollectOptions`].
    pub fn into_options(self) -> anyhow::Result<CollectOptions> {
        let layout = TableLayout {
            feature_column: self.feature_column,
            value_column: self.value_column,
            separator: parse_separator(&self.sep)?,
            has_header: self.header,
        };
        let opts = CollectOptions::new(
            self.output,
            self.table,
            self.names,
            layout,
            self.sum_on_duplicate_id,
            self.additional_attributes,
            self.gtf,
            self.feature_attribute,
        )?;
        Ok(opts)
    }
}
