use crate::collect_utils::open_input;
use crate::errors::CollectError;
use crate::options::TableLayout;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A single data row of a table: the feature id and the raw value of interest.
pub type TableEntry = (String, String);

/// Reads the `(feature, value)` pairs of one delimited table.
///
/// The reader yields one entry per data row, in file order. Quoted fields,
/// ragged rows and `\r\n` line endings are accepted; blank lines are skipped.
/// A row that does not have enough fields for the requested columns is
/// reported as [`CollectError::TooFewColumns`].
pub struct TableReader<R: Read> {
    source_name: String,
    layout: TableLayout,
    records: csv::StringRecordsIntoIter<R>,
}

impl TableReader<Box<dyn std::io::BufRead>> {
    /// Opens the table at `file_path`, decompressing it if it is gzipped.
    pub fn from_path<T: AsRef<Path>>(file_path: T, layout: &TableLayout) -> anyhow::Result<Self> {
        let file_path = file_path.as_ref();
        debug!("reading table {:?}", file_path);
        let rdr = open_input(file_path)?;
        Ok(TableReader::new(
            rdr,
            file_path.display().to_string(),
            layout,
        ))
    }
}

impl<R: Read> TableReader<R> {
    /// Creates a reader over any [`Read`] source. `source_name` is only used in
    /// error messages.
    pub fn new(rdr: R, source_name: impl Into<String>, layout: &TableLayout) -> TableReader<R> {
        let records = csv::ReaderBuilder::new()
            .delimiter(layout.separator)
            .has_headers(layout.has_header)
            .flexible(true)
            .from_reader(rdr)
            .into_records();
        TableReader {
            source_name: source_name.into(),
            layout: *layout,
            records,
        }
    }

    fn entry(&self, record: csv::StringRecord) -> anyhow::Result<TableEntry> {
        let min_fields = self.layout.min_fields();
        if record.len() < min_fields {
            return Err(CollectError::TooFewColumns {
                source_name: self.source_name.clone(),
                line: record.position().map_or(0, |p| p.line()),
                found: record.len(),
                needed: min_fields - 1,
            }
            .into());
        }
        Ok((
            record[self.layout.feature_column].to_string(),
            record[self.layout.value_column].to_string(),
        ))
    }
}

impl<R: Read> Iterator for TableReader<R> {
    type Item = anyhow::Result<TableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => {
                return Some(Err(anyhow::Error::new(e).context(format!(
                    "failed parsing the table {}",
                    self.source_name
                ))))
            }
        };
        Some(self.entry(record))
    }
}
