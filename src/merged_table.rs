//! The [`MergedTable`]: an outer join of the value columns of many tables on
//! their feature ids.

use crate::errors::CollectError;
use crate::options::{TableLayout, TableSource};
use crate::reader::table::{TableEntry, TableReader};
use crate::reporting::{CommandOutput, Diagnostic, Report};
use anyhow::Context;
use indexmap::IndexMap;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq)]
/// A single cell of the merged table.
///
/// Values are kept verbatim as read from the input. When duplicate feature ids
/// of a table are summed, every value of that table's column becomes a
/// [`Value::Number`].
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    /// Interprets the value as a number, if possible.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => Some(*n),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

type Row = Vec<Option<Value>>;

#[derive(Clone, Debug, Default)]
/// Maps each feature id to its values, one per sample column.
///
/// Rows are kept in the order their feature id was first seen, sample columns in
/// the order they were added. A row does not need a value for every sample; such
/// cells are `None` ("no value") and are written as empty fields.
pub struct MergedTable {
    samples: Vec<String>,
    rows: IndexMap<String, Row>,
}

impl MergedTable {
    pub fn new() -> MergedTable {
        MergedTable::default()
    }

    /// Reads every table in `tables`, in order, and merges their value columns.
    ///
    /// ### Arguments
    ///
    /// * `tables`: The tables to merge together with their (unique) sample names.
    /// * `layout`: The column layout shared by all tables.
    /// * `sum_on_duplicate`: How a feature id occurring more than once within a table is
    ///   handled. If `true` its values are summed, otherwise the last value is kept and a
    ///   [`Diagnostic::DuplicateFeature`] is added to the returned report.
    ///
    /// ### Returns
    ///
    /// The merged table and the report of the non-fatal issues encountered. The first
    /// read or format error aborts the merge.
    pub fn from_tables(
        tables: &[TableSource],
        layout: &TableLayout,
        sum_on_duplicate: bool,
    ) -> anyhow::Result<CommandOutput<MergedTable>> {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        for source in tables {
            let rdr = TableReader::from_path(&source.path, layout)?;
            let n_rows = table
                .add_sample(source.name.clone(), rdr, sum_on_duplicate, &mut report)
                .with_context(|| format!("failed merging the table {:?}", source.path))?;
            info!(
                "read {} rows for sample {} from {:?}",
                n_rows, source.name, source.path
            );
        }
        info!(
            "merged {} tables into a table of {} features",
            table.n_samples(),
            table.len()
        );
        Ok(CommandOutput::new(table, report))
    }

    /// Adds a sample column filled from `entries`, creating a row for every feature id
    /// not seen before. Returns the number of entries read.
    ///
    /// A feature id that appears more than once in `entries` either has its values summed
    /// (`sum_on_duplicate`), or the later value replaces the earlier one and the
    /// replacement is recorded in `report`. Once a sum happened, the whole column is
    /// converted to numbers; a value that is not a number is then an error.
    pub fn add_sample<I>(
        &mut self,
        name: impl Into<String>,
        entries: I,
        sum_on_duplicate: bool,
        report: &mut Report,
    ) -> anyhow::Result<usize>
    where
        I: IntoIterator<Item = anyhow::Result<TableEntry>>,
    {
        let col = self.samples.len();
        let name = name.into();
        self.samples.push(name.clone());

        let mut n_entries = 0usize;
        let mut summed = false;
        for entry in entries {
            let (feature, value) = entry?;
            n_entries += 1;

            let row = self.rows.entry(feature.clone()).or_default();
            if row.len() <= col {
                row.resize(col + 1, None);
            }
            let cell = &mut row[col];
            match cell.take() {
                None => *cell = Some(Value::Text(value)),
                Some(previous) if sum_on_duplicate => {
                    let sum = parse_number(&previous, &feature, &name)?
                        + parse_number(&Value::Text(value), &feature, &name)?;
                    *cell = Some(Value::Number(sum));
                    summed = true;
                }
                Some(_) => {
                    debug!("overwriting the value of {} in {}", feature, name);
                    report.add_issue(Diagnostic::DuplicateFeature {
                        feature,
                        column: name.clone(),
                    });
                    *cell = Some(Value::Text(value));
                }
            }
        }

        if summed {
            self.coerce_column(col, &name)?;
        }
        Ok(n_entries)
    }

    /// Turns every value of the sample column at `col` into a [`Value::Number`].
    fn coerce_column(&mut self, col: usize, name: &str) -> Result<(), CollectError> {
        for (feature, row) in self.rows.iter_mut() {
            if let Some(Some(value)) = row.get_mut(col) {
                if !value.is_number() {
                    *value = Value::Number(parse_number(value, feature, name)?);
                }
            }
        }
        Ok(())
    }

    /// The sample column names, in order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// The number of rows (distinct feature ids).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.rows.contains_key(feature)
    }

    /// The feature ids, in order of first appearance.
    pub fn features(&self) -> impl Iterator<Item = &String> {
        self.rows.keys()
    }

    /// The value of `feature` in the sample column `sample`, if any.
    pub fn get(&self, feature: &str, sample: &str) -> Option<&Value> {
        let col = self.samples.iter().position(|s| s == sample)?;
        self.rows.get(feature)?.get(col)?.as_ref()
    }

    /// The cells of the sample column at position `col` rendered as strings, one per row
    /// and in row order. Missing values are `None`.
    pub fn column(&self, col: usize) -> Vec<Option<String>> {
        self.rows
            .values()
            .map(|row| row.get(col).and_then(|c| c.as_ref()).map(|v| v.to_string()))
            .collect()
    }
}

fn parse_number(value: &Value, feature: &str, column: &str) -> Result<f64, CollectError> {
    value.as_number().ok_or_else(|| CollectError::NonNumericValue {
        feature: feature.to_string(),
        column: column.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(v: &[(&str, &str)]) -> Vec<anyhow::Result<TableEntry>> {
        v.iter()
            .map(|(f, c)| Ok((f.to_string(), c.to_string())))
            .collect()
    }

    fn text(s: &str) -> Option<Value> {
        Some(Value::Text(s.to_string()))
    }

    #[test]
    fn test_outer_join() -> anyhow::Result<()> {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        table.add_sample("s1", entries(&[("A", "1"), ("B", "2")]), false, &mut report)?;
        table.add_sample("s2", entries(&[("B", "20"), ("C", "30")]), false, &mut report)?;

        assert!(report.is_empty());
        assert_eq!(table.samples(), &["s1", "s2"]);
        assert_eq!(table.features().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(table.get("A", "s1").cloned(), text("1"));
        assert_eq!(table.get("A", "s2"), None);
        assert_eq!(table.get("B", "s1").cloned(), text("2"));
        assert_eq!(table.get("B", "s2").cloned(), text("20"));
        assert_eq!(table.get("C", "s1"), None);
        assert_eq!(table.get("C", "s2").cloned(), text("30"));

        assert_eq!(
            table.column(0),
            vec![Some(String::from("1")), Some(String::from("2")), None]
        );
        assert_eq!(
            table.column(1),
            vec![None, Some(String::from("20")), Some(String::from("30"))]
        );
        Ok(())
    }

    #[test]
    fn test_row_set_is_order_independent() -> anyhow::Result<()> {
        let t1 = [("A", "1"), ("B", "2")];
        let t2 = [("B", "20"), ("C", "30"), ("D", "40")];
        let mut report = Report::new();

        let mut forward = MergedTable::new();
        forward.add_sample("s1", entries(&t1), false, &mut report)?;
        forward.add_sample("s2", entries(&t2), false, &mut report)?;

        let mut backward = MergedTable::new();
        backward.add_sample("s2", entries(&t2), false, &mut report)?;
        backward.add_sample("s1", entries(&t1), false, &mut report)?;

        let mut f: Vec<&String> = forward.features().collect();
        let mut b: Vec<&String> = backward.features().collect();
        f.sort();
        b.sort();
        assert_eq!(f, b);
        assert_eq!(forward.len(), 4);
        assert_eq!(backward.samples(), &["s2", "s1"]);
        for feature in f {
            assert_eq!(forward.get(feature, "s1"), backward.get(feature, "s1"));
            assert_eq!(forward.get(feature, "s2"), backward.get(feature, "s2"));
        }
        Ok(())
    }

    #[test]
    fn test_same_table_twice() -> anyhow::Result<()> {
        let t = [("A", "1"), ("B", "2")];
        let mut report = Report::new();
        let mut table = MergedTable::new();
        table.add_sample("counts.tsv", entries(&t), false, &mut report)?;
        table.add_sample("counts.tsv.1", entries(&t), false, &mut report)?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.column(0), table.column(1));
        Ok(())
    }

    #[test]
    fn test_duplicate_overwrites() -> anyhow::Result<()> {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        table.add_sample(
            "sample2",
            entries(&[("MSTRG.6", "1.5"), ("MSTRG.7", "3"), ("MSTRG.6", "9926.898438")]),
            false,
            &mut report,
        )?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("MSTRG.6", "sample2").cloned(), text("9926.898438"));
        assert_eq!(
            report.entries(),
            &[Diagnostic::DuplicateFeature {
                feature: String::from("MSTRG.6"),
                column: String::from("sample2"),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_sums() -> anyhow::Result<()> {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        table.add_sample(
            "s1",
            entries(&[("A", "1"), ("B", "2"), ("A", "2.5"), ("A", "3")]),
            true,
            &mut report,
        )?;
        table.add_sample("s2", entries(&[("A", "7")]), true, &mut report)?;

        assert!(report.is_empty());
        let a = table.get("A", "s1").unwrap();
        assert!(a.is_number());
        assert_eq!(a.as_number(), Some(6.5));
        assert_eq!(a.to_string(), "6.5");
        assert_eq!(table.get("B", "s1").cloned(), Some(Value::Number(2.0)));
        // no duplicates in s2, so its values stay text
        assert_eq!(table.get("A", "s2").cloned(), text("7"));
        Ok(())
    }

    #[test]
    fn test_summed_column_is_numeric_throughout() -> anyhow::Result<()> {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        table.add_sample(
            "s1",
            entries(&[("A", "1.50"), ("B", "1"), ("B", "2")]),
            true,
            &mut report,
        )?;
        assert!(table.get("A", "s1").map_or(false, |v| v.is_number()));
        assert_eq!(
            table.column(0),
            vec![Some(String::from("1.5")), Some(String::from("3"))]
        );
        Ok(())
    }

    #[test]
    fn test_summed_column_rejects_text() {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        let err = table
            .add_sample(
                "s1",
                entries(&[("A", "1.50"), ("B", "1"), ("B", "2"), ("C", "x")]),
                true,
                &mut report,
            )
            .unwrap_err();
        match err.downcast_ref::<CollectError>() {
            Some(CollectError::NonNumericValue { feature, value, .. }) => {
                assert_eq!(feature, "C");
                assert_eq!(value, "x");
            }
            _ => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn test_integral_sum_renders_without_fraction() -> anyhow::Result<()> {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        table.add_sample("s1", entries(&[("A", "1"), ("A", "2")]), true, &mut report)?;
        assert_eq!(table.column(0), vec![Some(String::from("3"))]);
        Ok(())
    }

    #[test]
    fn test_sum_of_non_numeric_value() {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        let err = table
            .add_sample("s1", entries(&[("A", "1"), ("A", "many")]), true, &mut report)
            .unwrap_err();
        match err.downcast_ref::<CollectError>() {
            Some(CollectError::NonNumericValue {
                feature,
                column,
                value,
            }) => {
                assert_eq!(feature, "A");
                assert_eq!(column, "s1");
                assert_eq!(value, "many");
            }
            _ => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn test_entry_errors_are_propagated() {
        let mut table = MergedTable::new();
        let mut report = Report::new();
        let rows: Vec<anyhow::Result<TableEntry>> = vec![
            Ok((String::from("A"), String::from("1"))),
            Err(anyhow::anyhow!("broken row")),
        ];
        assert!(table.add_sample("s1", rows, false, &mut report).is_err());
    }
}
