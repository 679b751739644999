//! Event log ingestion: CSV or JSON files into raw event records

use crate::error::{AppError, Result};
use crate::models::RawEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported event log encodings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(InputFormat::Csv),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

/// Read an event log from disk.
///
/// `format` overrides detection by extension.
pub async fn load_events(path: &Path, format: Option<InputFormat>) -> Result<Vec<RawEvent>> {
    let format = format.or_else(|| InputFormat::from_path(path)).ok_or_else(|| {
        AppError::Ingest(format!(
            "cannot infer input format of {}; use .csv or .json",
            path.display()
        ))
    })?;

    let content = tokio::fs::read_to_string(path).await?;
    let events = parse_events(&content, format)?;

    tracing::info!(
        path = %path.display(),
        format = %format,
        events = events.len(),
        "Event log loaded"
    );
    Ok(events)
}

pub fn parse_events(content: &str, format: InputFormat) -> Result<Vec<RawEvent>> {
    match format {
        InputFormat::Csv => parse_csv(content),
        InputFormat::Json => parse_json(content),
    }
}

/// Parse a JSON array of event objects
pub fn parse_json(content: &str) -> Result<Vec<RawEvent>> {
    serde_json::from_str(content.trim_start_matches('\u{feff}'))
        .map_err(|e| AppError::Ingest(format!("invalid JSON event log: {}", e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    CaseId,
    Activity,
    Timestamp,
    Priority,
    Category,
    Agent,
}

impl Column {
    fn is_required(self) -> bool {
        matches!(self, Column::CaseId | Column::Activity | Column::Timestamp)
    }

    fn from_header(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "caseid" | "case" | "ticketid" | "ticket" => Some(Column::CaseId),
            "activity" | "stage" | "event" => Some(Column::Activity),
            "timestamp" | "time" | "datetime" => Some(Column::Timestamp),
            "priority" => Some(Column::Priority),
            "category" => Some(Column::Category),
            "agent" | "resource" | "assignee" => Some(Column::Agent),
            _ => None,
        }
    }
}

/// Parse a CSV event log with a header row.
///
/// Header names are matched case-insensitively (`Case_ID`, `case id` and
/// `caseid` are the same column). `Priority`, `Category` and `Agent` are
/// optional; unknown columns are ignored. A row may stop early as long as
/// only optional or unknown columns are left out; those read as absent.
pub fn parse_csv(content: &str) -> Result<Vec<RawEvent>> {
    let mut records = CsvRecords::new(content.trim_start_matches('\u{feff}'));

    let (_, header) = records
        .next()
        .transpose()?
        .ok_or_else(|| AppError::Ingest("empty CSV event log".to_string()))?;
    let columns: Vec<Option<Column>> = header.iter().map(|h| Column::from_header(h)).collect();

    for required in [Column::CaseId, Column::Activity, Column::Timestamp] {
        if !columns.contains(&Some(required)) {
            return Err(AppError::Ingest(format!(
                "CSV header is missing the {:?} column",
                required
            )));
        }
    }

    let mut events = Vec::new();
    for record in records {
        let (line, fields) = record?;
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let truncates_required = columns
            .iter()
            .skip(fields.len())
            .any(|c| c.is_some_and(Column::is_required));
        if fields.len() > columns.len() || truncates_required {
            return Err(AppError::Ingest(format!(
                "line {}: expected {} fields, found {}",
                line,
                columns.len(),
                fields.len()
            )));
        }

        let mut event = RawEvent::default();
        for (column, value) in columns.iter().zip(fields) {
            match column {
                Some(Column::CaseId) => event.case_id = value,
                Some(Column::Activity) => event.activity = value,
                Some(Column::Timestamp) => event.timestamp = value,
                Some(Column::Priority) => event.priority = Some(value),
                Some(Column::Category) => event.category = Some(value),
                Some(Column::Agent) => event.agent = Some(value),
                None => {}
            }
        }
        events.push(event);
    }

    Ok(events)
}

/// Quote-aware record iterator yielding `(starting line, fields)`
struct CsvRecords<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> CsvRecords<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            chars: content.chars().peekable(),
            line: 1,
        }
    }
}

impl Iterator for CsvRecords<'_> {
    type Item = Result<(usize, Vec<String>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chars.peek()?;

        let start = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;

        while let Some(c) = self.chars.next() {
            match c {
                '"' if in_quotes => {
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '"' if field.is_empty() => in_quotes = true,
                ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
                '\r' if !in_quotes && self.chars.peek() == Some(&'\n') => {}
                '\n' if !in_quotes => {
                    self.line += 1;
                    fields.push(field);
                    return Some(Ok((start, fields)));
                }
                '\n' => {
                    self.line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
        }

        if in_quotes {
            return Some(Err(AppError::Ingest(format!(
                "line {}: unterminated quoted field",
                start
            ))));
        }
        fields.push(field);
        Some(Ok((start, fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("log.CSV")),
            Some(InputFormat::Csv)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("events.json")),
            Some(InputFormat::Json)
        );
        assert_eq!(InputFormat::from_path(Path::new("events.xlsx")), None);
    }

    #[test]
    fn test_parse_csv_with_optional_columns() {
        let csv = "Case_ID,Activity,Timestamp,Priority,Category\n\
                   T-1,Ticket Created,2024-01-01 09:00:00,High,Network\n\
                   T-1,Closed,2024-01-02 09:00:00,,\n";
        let events = parse_csv(csv).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].priority.as_deref(), Some("High"));
        assert_eq!(events[1].priority.as_deref(), Some(""));
        assert!(events[0].agent.is_none());
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let csv = "case id,activity,timestamp,agent\r\n\
                   T-9,\"Waiting, on \"\"customer\"\"\",2024-01-01T10:00:00,\"Smith, J\"\r\n";
        let events = parse_csv(csv).unwrap();
        assert_eq!(events[0].activity, "Waiting, on \"customer\"");
        assert_eq!(events[0].agent.as_deref(), Some("Smith, J"));
    }

    #[test]
    fn test_parse_csv_multiline_field_keeps_line_numbers() {
        let csv = "Case_ID,Activity,Timestamp\n\
                   T-1,\"Note\nspanning\",2024-01-01 09:00\n\
                   T-1,Closed\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(err.to_string().contains("line 4"), "{}", err);
    }

    #[test]
    fn test_parse_csv_short_row_drops_trailing_optional_columns() {
        let csv = "Case_ID,Activity,Timestamp,Priority,Category,Agent\n\
                   T-1,Ticket Created,2024-01-01 08:00,High,Network,ana\n\
                   T-1,Closed,2024-01-01 09:00\n";
        let events = parse_csv(csv).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].timestamp, "2024-01-01 09:00");
        assert!(events[1].priority.is_none());
        assert!(events[1].category.is_none());
        assert!(events[1].agent.is_none());
    }

    #[test]
    fn test_parse_csv_rejects_row_missing_required_or_extra_fields() {
        let header = "Priority,Case_ID,Activity,Timestamp\n";
        let err = parse_csv(&format!("{}High,T-1,Closed\n", header)).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let err = parse_csv(&format!("{}High,T-1,Closed,2024-01-01 09:00,x\n", header)).unwrap_err();
        assert!(err.to_string().contains("found 5"), "{}", err);
    }

    #[test]
    fn test_parse_csv_requires_core_columns() {
        let err = parse_csv("Case_ID,Timestamp\nT-1,2024-01-01\n").unwrap_err();
        assert_eq!(err.error_code(), "INGEST_ERROR");
        assert!(parse_csv("").is_err());
    }

    #[test]
    fn test_parse_json_accepts_column_aliases() {
        let json = r#"[
            {"Case_ID": "T-1", "Activity": "Ticket Created", "Timestamp": "2024-01-01T09:00:00Z", "Priority": "Low"},
            {"case_id": "T-1", "activity": "Closed", "timestamp": "2024-01-01T12:00:00Z", "agent": "ana"}
        ]"#;
        let events = parse_json(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].priority.as_deref(), Some("Low"));
        assert_eq!(events[1].agent.as_deref(), Some("ana"));
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(matches!(parse_json("{\"events\": 3}"), Err(AppError::Ingest(_))));
    }
}
