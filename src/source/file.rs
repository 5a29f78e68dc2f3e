//! File-based row source.
//!
//! Reads comma-separated records line by line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::{split_fields, Row, RowSource};
use crate::error::SourceError;

/// A source that reads CSV records from any buffered reader.
///
/// Blank lines are skipped. Both `\n` and `\r\n` line endings are accepted.
#[derive(Debug)]
pub struct CsvSource<R> {
    reader: R,
    description: String,
    delimiter: char,
    line: u64,
    buf: String,
}

impl CsvSource<BufReader<File>> {
    /// Open a CSV file for sequential reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(
            BufReader::new(file),
            &format!("file: {}", path.display()),
        ))
    }
}

impl<R: BufRead> CsvSource<R> {
    pub fn new(reader: R, description: &str) -> Self {
        Self {
            reader,
            description: description.to_string(),
            delimiter: ',',
            line: 0,
            buf: String::new(),
        }
    }

    /// Use a delimiter other than `,`.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl<R: BufRead + Send + std::fmt::Debug> RowSource for CsvSource<R> {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        loop {
            self.buf.clear();
            self.line += 1;
            let read = self
                .reader
                .read_line(&mut self.buf)
                .map_err(|source| SourceError::Read {
                    line: self.line,
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }

            let record = self.buf.trim_end_matches(&['\r', '\n'][..]);
            if record.trim().is_empty() {
                debug!(line = self.line, "skipping blank line");
                continue;
            }

            return Ok(Some(Row::new(
                self.line,
                split_fields(record, self.delimiter),
            )));
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn sample_csv() -> &'static str {
        "Time (UTC),Channel1,Channel2,Channel3\n\
         03/07/23 14:00:00,35,,\n\
         03/07/23 14:00:30,35.9,,\n"
    }

    #[test]
    fn test_csv_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", sample_csv()).unwrap();

        let mut source = CsvSource::open(file.path()).unwrap();
        assert!(source.description().starts_with("file: "));

        let header = source.next_row().unwrap().unwrap();
        assert_eq!(header.line, 1);
        assert_eq!(header.fields[0], "Time (UTC)");

        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["03/07/23 14:00:00", "35", "", ""]);

        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.line, 3);
        assert!(source.next_row().unwrap().is_none());
        // exhausted sources stay exhausted
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_csv_source_missing_file() {
        let err = CsvSource::open("/nonexistent/path/smoker-temps.csv").unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
        assert!(err.to_string().contains("smoker-temps.csv"));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let data = "ts,a\r\n\r\nt1,1.5\r\n   \nt2,2\r\n";
        let mut source = CsvSource::new(Cursor::new(data), "cursor");

        let header = source.next_row().unwrap().unwrap();
        assert_eq!(header.fields, vec!["ts", "a"]);

        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.line, 3);
        assert_eq!(row.fields, vec!["t1", "1.5"]);

        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.line, 5);
        assert_eq!(row.fields, vec!["t2", "2"]);

        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_custom_delimiter() {
        let mut source = CsvSource::new(Cursor::new("t;1;2\n"), "cursor").with_delimiter(';');
        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["t", "1", "2"]);
    }
}
