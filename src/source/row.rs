//! Row parser: raw record in, per-channel readings out.

use std::fmt;

use crate::channels::{Channel, ChannelRegistry};
use crate::error::FieldError;

use super::Row;

/// A timestamped value destined for exactly one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Opaque timestamp token, copied from field 0 of its row.
    pub timestamp: String,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Frame this reading as `"<timestamp>, <value>"`.
    pub fn to_message(&self) -> Message {
        Message::from(format!("{}, {}", self.timestamp, format_value(self.value)))
    }
}

/// Wire payload of one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Vec<u8>,
}

impl Message {
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self {
            payload: text.into_bytes(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.payload))
    }
}

/// Result of parsing one row against the registry.
#[derive(Debug, Clone)]
pub struct ParsedRow<'a> {
    pub timestamp: String,
    /// One entry per registered channel, in registry order.
    pub fields: Vec<(&'a Channel, Result<f64, FieldError>)>,
}

impl<'a> ParsedRow<'a> {
    /// Channels that produced a reading, in channel order.
    pub fn readings(&self) -> impl Iterator<Item = (&'a Channel, Reading)> + '_ {
        self.fields.iter().filter_map(|(channel, value)| {
            value
                .as_ref()
                .ok()
                .map(|v| (*channel, Reading::new(self.timestamp.clone(), *v)))
        })
    }

    /// Number of channel fields that failed conversion.
    pub fn dropped(&self) -> usize {
        self.fields.iter().filter(|(_, v)| v.is_err()).count()
    }
}

/// Convert one channel field to a finite number.
pub fn parse_value(field: Option<&str>) -> Result<f64, FieldError> {
    let raw = field.ok_or(FieldError::Missing)?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FieldError::NotNumeric(raw.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError::NonFinite(raw.to_string()))
    }
}

/// Parse a row: field 0 is the timestamp, field `i + 1` feeds channel `i`.
///
/// Conversion failures are recorded per field and never abort the row.
pub fn parse_row<'a>(row: &Row, registry: &'a ChannelRegistry) -> ParsedRow<'a> {
    let fields = registry
        .iter()
        .enumerate()
        .map(|(i, channel)| (channel, parse_value(row.field(i + 1))))
        .collect();

    ParsedRow {
        timestamp: row.timestamp().to_string(),
        fields,
    }
}

/// Render a value with a decimal point even when it is integral.
pub fn format_value(value: f64) -> String {
    let text = value.to_string();
    if text.contains(&['.', 'e', 'E'][..]) || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::split_fields;

    fn row(line: &str) -> Row {
        Row::new(2, split_fields(line, ','))
    }

    fn messages(parsed: &ParsedRow<'_>) -> Vec<(String, String)> {
        parsed
            .readings()
            .map(|(c, r)| (c.queue.clone(), r.to_message().to_string()))
            .collect()
    }

    #[test]
    fn test_full_row() {
        let registry = ChannelRegistry::smoker();
        let parsed = parse_row(&row("2023-01-01T00:00,225.5,110.3,95.2"), &registry);
        assert_eq!(parsed.timestamp, "2023-01-01T00:00");
        assert_eq!(
            messages(&parsed),
            vec![
                ("01-smoker".to_string(), "2023-01-01T00:00, 225.5".to_string()),
                ("02-food-A".to_string(), "2023-01-01T00:00, 110.3".to_string()),
                ("03-food-B".to_string(), "2023-01-01T00:00, 95.2".to_string()),
            ]
        );
        assert_eq!(parsed.dropped(), 0);
    }

    #[test]
    fn test_blank_fields_dropped_independently() {
        let registry = ChannelRegistry::smoker();
        let parsed = parse_row(&row("2023-01-01T00:30,,109.8,"), &registry);
        assert_eq!(
            messages(&parsed),
            vec![("02-food-A".to_string(), "2023-01-01T00:30, 109.8".to_string())]
        );
        assert_eq!(parsed.dropped(), 2);
        assert_eq!(
            parsed.fields[0].1,
            Err(FieldError::NotNumeric(String::new()))
        );
    }

    #[test]
    fn test_short_row_marks_missing() {
        let registry = ChannelRegistry::smoker();
        let parsed = parse_row(&row("t,1.0"), &registry);
        assert_eq!(parsed.fields[0].1, Ok(1.0));
        assert_eq!(parsed.fields[1].1, Err(FieldError::Missing));
        assert_eq!(parsed.fields[2].1, Err(FieldError::Missing));
    }

    #[test]
    fn test_label_row_yields_nothing() {
        let registry = ChannelRegistry::smoker();
        let parsed = parse_row(&row("Time (UTC),Channel1,Channel2,Channel3"), &registry);
        assert_eq!(parsed.readings().count(), 0);
        assert_eq!(parsed.dropped(), 3);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(Some(" 95.2 ")), Ok(95.2));
        assert_eq!(parse_value(Some("-3")), Ok(-3.0));
        assert_eq!(parse_value(None), Err(FieldError::Missing));
        assert_eq!(
            parse_value(Some("hot")),
            Err(FieldError::NotNumeric("hot".to_string()))
        );
        assert_eq!(
            parse_value(Some("NaN")),
            Err(FieldError::NonFinite("NaN".to_string()))
        );
        assert_eq!(
            parse_value(Some("1e400")),
            Err(FieldError::NonFinite("1e400".to_string()))
        );
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(225.5), "225.5");
        assert_eq!(format_value(225.0), "225.0");
        assert_eq!(format_value(-0.25), "-0.25");
        assert_eq!(format_value(0.0), "0.0");
    }

    #[test]
    fn test_timestamp_is_opaque() {
        let registry = ChannelRegistry::smoker();
        let parsed = parse_row(&row("not a date,1,2,3"), &registry);
        assert!(parsed.readings().all(|(_, r)| r.timestamp == "not a date"));
    }
}
