//! Collecting additional attributes for the rows of a [`MergedTable`] from the
//! records of a GTF/GFF file.
//!
//! Every record names the feature(s) it belongs to through the *feature
//! attribute* (e.g. `gene_id`). For each requested attribute, the values of all
//! records belonging to a feature are gathered into one list, in order of first
//! appearance and without repeats, and finally joined with `;`.

use crate::collect_utils::ATTRIBUTE_VALUE_SEPARATOR;
use crate::merged_table::MergedTable;
use crate::reader::gxf::{read_attribute_records, AttributeRecord};
use indexmap::IndexMap;
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// An ordered list of distinct attribute values.
pub struct AttributeValues(Vec<String>);

impl AttributeValues {
    /// Appends `value` unless the list already holds it.
    pub fn push(&mut self, value: &str) {
        if !self.0.iter().any(|v| v == value) {
            self.0.push(value.to_string());
        }
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The values joined with `;`, or `None` if there are no values.
    pub fn joined(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.join(ATTRIBUTE_VALUE_SEPARATOR))
        }
    }
}

/// Accumulates the attribute values of the records belonging to the rows of a
/// [`MergedTable`]. Records are fed one at a time with [`AttributeCollector::add_record`].
///
/// Only features that are rows of the table are tracked; records of other features
/// are ignored.
pub struct AttributeCollector<'a> {
    table: &'a MergedTable,
    feature_attribute: String,
    attributes: Vec<String>,
    // per feature, one value list per requested attribute
    rows: IndexMap<String, Vec<AttributeValues>>,
    n_records: usize,
}

impl<'a> AttributeCollector<'a> {
    pub fn new(
        table: &'a MergedTable,
        feature_attribute: impl Into<String>,
        attributes: &[String],
    ) -> AttributeCollector<'a> {
        AttributeCollector {
            table,
            feature_attribute: feature_attribute.into(),
            attributes: attributes.to_vec(),
            rows: IndexMap::new(),
            n_records: 0,
        }
    }

    /// Adds the values of a single record to every feature the record belongs to.
    pub fn add_record(&mut self, rec: &AttributeRecord) {
        self.n_records += 1;
        for feature in rec.get(&self.feature_attribute) {
            if !self.table.contains(feature) {
                continue;
            }
            let lists = self
                .rows
                .entry(feature.clone())
                .or_insert_with(|| vec![AttributeValues::default(); self.attributes.len()]);
            for (attr, list) in self.attributes.iter().zip(lists.iter_mut()) {
                for value in rec.get(attr) {
                    list.push(value);
                }
            }
        }
    }

    /// Finishes the collection.
    pub fn finish(self) -> Annotations {
        let n_annotated = self
            .rows
            .values()
            .filter(|lists| lists.iter().any(|l| !l.is_empty()))
            .count();
        info!(
            "scanned {} records; {} of {} features received additional attributes",
            self.n_records,
            n_annotated,
            self.table.len()
        );
        Annotations {
            attributes: self.attributes,
            rows: self.rows,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// The collected attribute values, per feature and per requested attribute.
pub struct Annotations {
    attributes: Vec<String>,
    rows: IndexMap<String, Vec<AttributeValues>>,
}

impl Annotations {
    /// The requested attribute names, in column order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The values of `attribute` collected for `feature`. Empty if there are none.
    pub fn values(&self, feature: &str, attribute: &str) -> &[String] {
        self.attributes
            .iter()
            .position(|a| a == attribute)
            .and_then(|idx| self.rows.get(feature).map(|lists| lists[idx].values()))
            .unwrap_or(&[])
    }

    /// The joined value of `attribute` for `feature`, or `None` if no value was collected.
    pub fn joined(&self, feature: &str, attribute: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|a| a == attribute)?;
        self.rows.get(feature)?[idx].joined()
    }

    /// The column of the attribute at position `idx`, aligned with the rows of `table`.
    pub fn column(&self, table: &MergedTable, idx: usize) -> Vec<Option<String>> {
        table
            .features()
            .map(|feature| self.rows.get(feature).and_then(|lists| lists[idx].joined()))
            .collect()
    }
}

/// Collects `attributes` for the rows of `table` from `records`.
///
/// ### Arguments
///
/// * `table`: The table whose feature ids are annotated. It is not modified; records
///   naming features that are not rows of the table are ignored.
/// * `records`: The records of the annotation source, consumed in a single pass.
/// * `feature_attribute`: The attribute holding the feature id(s) of a record.
/// * `attributes`: The attributes to collect, in column order.
pub fn annotate<'r, I>(
    table: &MergedTable,
    records: I,
    feature_attribute: &str,
    attributes: &[String],
) -> Annotations
where
    I: IntoIterator<Item = &'r AttributeRecord>,
{
    let mut collector = AttributeCollector::new(table, feature_attribute, attributes);
    for rec in records {
        collector.add_record(rec);
    }
    collector.finish()
}

/// Collects `attributes` for the rows of `table` from the GTF/GFF file at `gtf`.
pub fn annotate_from_file<T: AsRef<Path>>(
    table: &MergedTable,
    gtf: T,
    feature_attribute: &str,
    attributes: &[String],
) -> anyhow::Result<Annotations> {
    let mut collector = AttributeCollector::new(table, feature_attribute, attributes);
    read_attribute_records(gtf, |rec| collector.add_record(rec))?;
    Ok(collector.finish())
}
