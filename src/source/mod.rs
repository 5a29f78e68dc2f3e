//! Row sources and the row parser.
//!
//! A [`RowSource`] hands out raw records one at a time; [`parse_row`] turns
//! each record into the readings it carries.

mod fields;
mod file;
mod row;

pub use fields::split_fields;
pub use file::CsvSource;
pub use row::{format_value, parse_row, parse_value, Message, ParsedRow, Reading};

use std::collections::VecDeque;
use std::fmt::Debug;

use crate::error::SourceError;

/// One raw record: field 0 is the timestamp, fields 1.. are channel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the source, for diagnostics.
    pub line: u64,
    pub fields: Vec<String>,
}

impl Row {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Field 0, or an empty timestamp for an empty record.
    pub fn timestamp(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Trait for reading rows sequentially from a tabular source.
///
/// Returning `Ok(None)` means the source is exhausted.
pub trait RowSource: Send + Debug {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// A source backed by rows held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: VecDeque<Row>,
    description: String,
}

impl MemorySource {
    /// Build from already-split records; line numbers start at 1.
    pub fn new<I, R, F>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = F>,
        F: Into<String>,
    {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Row::new(i as u64 + 1, r.into_iter().map(Into::into).collect()))
            .collect();
        Self {
            rows,
            description: "memory".to_string(),
        }
    }

    /// Build from comma-separated lines.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(lines.into_iter().map(|l| split_fields(l, ',')))
    }
}

impl RowSource for MemorySource {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        Ok(self.rows.pop_front())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
