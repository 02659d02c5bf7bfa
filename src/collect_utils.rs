use crate::errors::CollectError;
use anyhow::Context;
use flate2::bufread::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::trace;

/// The name of the first column of the merged table.
pub const FEATURE_COLUMN: &str = "feature";

/// The string used to join multiple attribute values into one cell.
pub const ATTRIBUTE_VALUE_SEPARATOR: &str = ";";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// The annotation file formats from which additional attributes can be read.
///
/// # Variants
///
/// * `GTF` - Gene Transfer Format (GFF2 flavour), attributes written as `key "value";`.
/// * `GFF` - General Feature Format version 3, attributes written as `key=value1,value2;`.
pub enum FileFormat {
    GTF,
    GFF,
}

impl FileFormat {
    /// Determines the format of an annotation file from its extension. A trailing
    /// `.gz` extension is skipped. Returns `None` if the extension is not one of
    /// `gtf`, `gff2`, `gff` or `gff3`.
    pub fn from_path<T: AsRef<Path>>(file_path: T) -> Option<FileFormat> {
        let file_path = file_path.as_ref();
        let mut ext = file_path.extension()?.to_str()?.to_lowercase();
        if ext == "gz" {
            ext = Path::new(file_path.file_stem()?)
                .extension()?
                .to_str()?
                .to_lowercase();
        }
        ext.parse().ok()
    }

    /// Determines the format of an annotation file, first from its extension
    /// and, if that fails, by looking at the attribute column of the first
    /// record line. GFF3 attributes are `key=value` pairs, everything else is
    /// treated as GTF.
    pub fn detect<T: AsRef<Path>>(file_path: T) -> anyhow::Result<FileFormat> {
        let file_path = file_path.as_ref();
        if let Some(ft) = FileFormat::from_path(file_path) {
            return Ok(ft);
        }

        let rdr = open_input(file_path)?;
        for l in rdr.lines() {
            let line = l?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let attributes = line
                .split('\t')
                .nth(8)
                .ok_or_else(|| CollectError::UnknownAnnotationFormat(file_path.to_path_buf()))?;
            let first = attributes.split(';').next().unwrap_or("").trim();
            let ft = match (first.find('='), first.find(' ')) {
                (Some(eq), Some(sp)) if eq < sp => FileFormat::GFF,
                (Some(_), None) => FileFormat::GFF,
                _ => FileFormat::GTF,
            };
            trace!("sniffed {} from the first record of {:?}", ft, file_path);
            return Ok(ft);
        }
        Err(CollectError::UnknownAnnotationFormat(file_path.to_path_buf()).into())
    }

    pub fn is_gtf(&self) -> bool {
        matches!(self, FileFormat::GTF)
    }
}

impl std::str::FromStr for FileFormat {
    type Err = anyhow::Error;

    /// Converts from a [&str] to an appropriate [FileFormat] type.
    fn from_str(s: &str) -> anyhow::Result<FileFormat> {
        let ft = match s.to_lowercase().as_str() {
            "gtf" => FileFormat::GTF,
            "gff2" => FileFormat::GTF,
            "gff" => FileFormat::GFF,
            "gff3" => FileFormat::GFF,
            _ => anyhow::bail!("Cannot parse the annotation file type."),
        };
        Ok(ft)
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::GTF => write!(f, "GTF"),
            FileFormat::GFF => write!(f, "GFF"),
        }
    }
}

/// Checks if the content of the provided reader starts with the gzip magic
/// number. The reader is not consumed.
pub fn is_gzipped<T: BufRead>(reader: &mut T) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    if src.get(..2) == Some(&GZIP_MAGIC_NUMBER) {
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Opens a file for buffered reading, transparently decompressing it if it is
/// gzip compressed.
pub fn open_input<T: AsRef<Path>>(file_path: T) -> anyhow::Result<Box<dyn BufRead>> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path)
        .with_context(|| format!("could not open the input file {:?}", file_path))?;
    let mut inner_rdr = BufReader::new(file);
    if is_gzipped(&mut inner_rdr)? {
        trace!("auto-detected gzipped file {:?} - reading via decompression", file_path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(inner_rdr))))
    } else {
        Ok(Box::new(inner_rdr))
    }
}

/// Parses the field separator given on the command line. The separator must
/// be a single ASCII character; `\t` (backslash followed by `t`) and `tab`
/// are accepted as a tab.
pub fn parse_separator(sep: &str) -> Result<u8, CollectError> {
    match sep {
        "\\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        s => Err(CollectError::InvalidSeparator(s.to_string())),
    }
}

/// Makes a list of column names unique by suffixing repeated names with
/// `.1`, `.2`, ... in order of appearance. A suffixed name that collides with
/// a name given later is suffixed further.
pub fn unique_column_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        while let Some(n) = seen.get_mut(&candidate) {
            *n += 1;
            candidate = format!("{}.{}", name, n);
        }
        seen.insert(candidate.clone(), 0);
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(FileFormat::from_path("genes.gtf"), Some(FileFormat::GTF));
        assert_eq!(FileFormat::from_path("genes.GTF.gz"), Some(FileFormat::GTF));
        assert_eq!(FileFormat::from_path("genes.gff3"), Some(FileFormat::GFF));
        assert_eq!(FileFormat::from_path("genes.gff.gz"), Some(FileFormat::GFF));
        assert_eq!(FileFormat::from_path("genes.txt"), None);
        assert_eq!(FileFormat::from_path("genes"), None);
    }

    #[test]
    fn test_file_format_sniffing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let gff = dir.path().join("genes.annotation");
        std::fs::write(
            &gff,
            "##gff-version 3\nchr1\tsrc\tgene\t1\t10\t.\t+\t.\tID=g1;Name=A\n",
        )?;
        assert_eq!(FileFormat::detect(&gff)?, FileFormat::GFF);

        let gtf = dir.path().join("genes.annotation2");
        std::fs::write(
            &gtf,
            "#!comment\nchr1\tsrc\tgene\t1\t10\t.\t+\t.\tgene_id \"g1\"; gene_name \"a=b\";\n",
        )?;
        assert_eq!(FileFormat::detect(&gtf)?, FileFormat::GTF);

        let empty = dir.path().join("empty.annotation");
        std::fs::write(&empty, "# nothing here\n")?;
        let err = FileFormat::detect(&empty).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CollectError>(),
            Some(CollectError::UnknownAnnotationFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn test_open_input_gzipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("table.tsv.gz");
        let mut enc = GzEncoder::new(std::fs::File::create(&path)?, Compression::default());
        enc.write_all(b"A\t1\nB\t2\n")?;
        enc.finish()?;

        let mut content = String::new();
        open_input(&path)?.read_to_string(&mut content)?;
        assert_eq!(content, "A\t1\nB\t2\n");
        Ok(())
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator("\t").unwrap(), b'\t');
        assert_eq!(parse_separator("\\t").unwrap(), b'\t');
        assert_eq!(parse_separator(";").unwrap(), b';');
        assert!(parse_separator(";;").is_err());
        assert!(parse_separator("").is_err());
        assert!(parse_separator("é").is_err());
    }

    #[test]
    fn test_unique_column_names() {
        let names = vec!["a", "b", "a", "a", "a.1"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            unique_column_names(names),
            vec!["a", "b", "a.1", "a.2", "a.1.1"]
        );
    }
}
