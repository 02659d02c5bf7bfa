use crate::collect_utils::{is_gzipped, FileFormat};
use anyhow::Context;
use flate2::bufread::MultiGzDecoder;
use indexmap::IndexMap;
use noodles::{gff, gtf};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// The attributes of a single GTF/GFF record.
///
/// Each attribute name maps to the ordered list of its distinct values. In a GTF file
/// a multi-valued attribute is written as repeated keys (`tag "basic"; tag "CCDS";`),
/// in a GFF3 file as a comma separated list (`Alias=a,b`); both end up as one list.
pub struct AttributeRecord {
    attributes: IndexMap<String, Vec<String>>,
}

impl AttributeRecord {
    pub fn new() -> AttributeRecord {
        AttributeRecord::default()
    }

    /// Adds a value to an attribute, unless the attribute already holds it.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let values = self.attributes.entry(key.into()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// The values of an attribute; empty if the record does not have it.
    pub fn get(&self, key: &str) -> &[String] {
        self.attributes.get(key).map_or(&[], |v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn clear(&mut self) {
        self.attributes.clear();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rec = AttributeRecord::new();
        for (k, v) in iter {
            rec.push(k, v);
        }
        rec
    }
}

/// Reads the attribute records of a GTF or GFF file and hands them, one at a
/// time and in file order, to `f`. The format is detected from the file
/// extension or, failing that, from the first record. Gzipped files are
/// decompressed on the fly.
///
/// Returns the number of records read.
pub fn read_attribute_records<T, F>(file_path: T, f: F) -> anyhow::Result<usize>
where
    T: AsRef<Path>,
    F: FnMut(&AttributeRecord),
{
    let file_path = file_path.as_ref();
    let file_type = FileFormat::detect(file_path)?;
    debug!("reading {:?} as a {} file", file_path, file_type);

    let file = File::open(file_path)
        .with_context(|| format!("could not open the annotation file {:?}", file_path))?;
    let mut inner_rdr = BufReader::new(file);
    let rdr: Box<dyn BufRead> = if is_gzipped(&mut inner_rdr)? {
        info!("auto-detected gzipped file - reading via decompression");
        Box::new(BufReader::new(MultiGzDecoder::new(inner_rdr)))
    } else {
        Box::new(inner_rdr)
    };

    let n_records = if file_type.is_gtf() {
        read_gtf_records(rdr, f)
    } else {
        read_gff_records(rdr, f)
    }
    .with_context(|| format!("failed reading the {} file {:?}", file_type, file_path))?;

    info!(
        "Finished parsing the annotation file. Found {} records.",
        n_records
    );
    Ok(n_records)
}

/// Reads the records of a GTF file from `rdr`.
pub fn read_gtf_records<R, F>(rdr: R, mut f: F) -> anyhow::Result<usize>
where
    R: BufRead,
    F: FnMut(&AttributeRecord),
{
    let mut rdr = gtf::Reader::new(rdr);
    // reusable record to take the attributes of each line
    let mut rec = AttributeRecord::new();
    let mut n_records = 0usize;

    for l in rdr.lines() {
        let line = l?;
        match line {
            gtf::Line::Record(r) => {
                n_records += 1;
                rec.clear();
                for attr in r.attributes().iter() {
                    rec.push(attr.key(), attr.value());
                }
                f(&rec);
            }
            gtf::Line::Comment(_) => continue,
        }
    }
    Ok(n_records)
}

/// Reads the records of a GFF3 file from `rdr`. Comments and directives are skipped.
pub fn read_gff_records<R, F>(rdr: R, mut f: F) -> anyhow::Result<usize>
where
    R: BufRead,
    F: FnMut(&AttributeRecord),
{
    let mut rdr = gff::Reader::new(rdr);
    let mut rec = AttributeRecord::new();
    let mut n_records = 0usize;

    for l in rdr.lines() {
        let line = l?;
        match line {
            gff::Line::Record(r) => {
                n_records += 1;
                rec.clear();
                for (attrk, attrv) in r.attributes().iter() {
                    match attrv {
                        gff::record::attributes::field::Value::String(val) => {
                            rec.push(attrk.to_string(), val.to_string());
                        }
                        gff::record::attributes::field::Value::Array(a) => {
                            for s in a.iter() {
                                rec.push(attrk.to_string(), s.to_string());
                            }
                        }
                    }
                }
                f(&rec);
            }
            gff::Line::Comment(_) | gff::Line::Directive(_) => continue,
        }
    }
    Ok(n_records)
}
