//! Word corpora loaded from one-column CSV files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CorpusError;

/// Name of the single logical column of a corpus file.
pub const WORDS_COLUMN: &str = "Words";

/// One corpus entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Position in load order.
    pub id: usize,

    /// The original short string, e.g. a word or phrase.
    pub text: String,
}

impl Record {
    /// Create a record with an explicit id.
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// An ordered list of records with ids assigned in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    records: Vec<Record>,
}

impl Corpus {
    /// Build a corpus from in-memory strings, numbering them from zero.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Record::new(id, text))
            .collect();
        Self { records }
    }

    /// Parse a headerless, comma-delimited word list.
    ///
    /// Only the first field of each row is read. Blank rows and rows whose
    /// first field is empty after trimming are skipped and do not consume an id.
    /// A value containing a line break is rejected as [`CorpusError::Malformed`];
    /// the reader only produces one when a quote is left open.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CorpusError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b',')
            .quote(b'"')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (row, result) in csv.records().enumerate() {
            let row_fields = result?;
            match row_fields.get(0) {
                Some(text) if text.contains(['\n', '\r']) => {
                    let line = row_fields.position().map_or(row + 1, |p| p.line() as usize);
                    return Err(CorpusError::Malformed {
                        row: line,
                        reason: "value spans multiple lines; check for an unbalanced quote"
                            .to_string(),
                    });
                }
                Some(text) if !text.is_empty() => {
                    records.push(Record::new(records.len(), text));
                }
                _ => debug!("Skipping empty {WORDS_COLUMN} value on row {row}"),
            }
        }

        Ok(Self { records })
    }

    /// Load a corpus file from disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let corpus = Self::from_reader(file)?;
        info!("Loaded {} records from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in id order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The first `rows` records, for a short look at what was loaded.
    pub fn preview(&self, rows: usize) -> &[Record] {
        &self.records[..rows.min(self.records.len())]
    }

    /// Consume the corpus, yielding its records for [`crate::SimilarityIndex::build`].
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn texts(corpus: &Corpus) -> Vec<&str> {
        corpus.records().iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_from_reader_assigns_ids_in_order() {
        let corpus = Corpus::from_reader("apple\nbanana\norange\n".as_bytes()).unwrap();

        assert_eq!(texts(&corpus), vec!["apple", "banana", "orange"]);
        let ids: Vec<usize> = corpus.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_first_row_is_data_not_header() {
        let corpus = Corpus::from_reader("Words\ncar\n".as_bytes()).unwrap();
        assert_eq!(texts(&corpus), vec!["Words", "car"]);
    }

    #[test]
    fn test_quoted_fields_and_extra_columns() {
        let input = "\"ice cream\",dessert\n  bus  \n\"a, b\"\n";
        let corpus = Corpus::from_reader(input.as_bytes()).unwrap();
        assert_eq!(texts(&corpus), vec!["ice cream", "bus", "a, b"]);
    }

    #[test]
    fn test_blank_rows_do_not_consume_ids() {
        let corpus = Corpus::from_reader("apple\n\n   \n,orphan\nbus\n".as_bytes()).unwrap();

        assert_eq!(
            corpus.records(),
            &[Record::new(0, "apple"), Record::new(1, "bus")]
        );
    }

    #[test]
    fn test_invalid_utf8_is_a_csv_error() {
        let result = Corpus::from_reader(&b"apple\n\xff\xfe\n"[..]);
        assert!(matches!(result, Err(CorpusError::Csv(_))));
    }

    #[test]
    fn test_unbalanced_quote_is_malformed() {
        let result = Corpus::from_reader("apple\n\"banana\norange\n".as_bytes());
        assert!(matches!(result, Err(CorpusError::Malformed { row: 2, .. })));
    }

    #[test]
    fn test_quoted_line_break_is_malformed() {
        let result = Corpus::from_reader("\"ice\r\ncream\"\nbus\n".as_bytes());
        assert!(matches!(result, Err(CorpusError::Malformed { row: 1, .. })));
    }

    #[test]
    fn test_from_csv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"apple\nbanana\n").unwrap();

        let corpus = Corpus::from_csv_path(file.path()).unwrap();
        assert_eq!(texts(&corpus), vec!["apple", "banana"]);
    }

    #[test]
    fn test_missing_file() {
        let result = Corpus::from_csv_path("/definitely/not/here.csv");
        assert!(matches!(result, Err(CorpusError::Io(_))));
    }

    #[test]
    fn test_preview_is_clamped() {
        let corpus = Corpus::from_texts(["a", "b"]);
        assert_eq!(corpus.preview(3).len(), 2);
        assert_eq!(corpus.preview(1), &[Record::new(0, "a")]);
    }
}
