//! Load simulations, projects and payment history from JSON or CSV exports

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{PaymentHistoryEntry, ProjectRecord, SimulationRecord};
use crate::error::RecordError;

/// A file holding either one record or an array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Read JSON records from any reader
pub fn load_json_from_reader<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, RecordError> {
    let parsed: OneOrMany<T> = serde_json::from_reader(reader)?;
    Ok(parsed.into())
}

/// Read JSON records from a file
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>, RecordError> {
    let file = File::open(path)?;
    load_json_from_reader(BufReader::new(file))
}

pub fn load_simulations<P: AsRef<Path>>(path: P) -> Result<Vec<SimulationRecord>, RecordError> {
    load_json(path)
}

pub fn load_projects<P: AsRef<Path>>(path: P) -> Result<Vec<ProjectRecord>, RecordError> {
    load_json(path)
}

/// Raw CSV row of a payment history export
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    required: Option<String>,
    #[serde(default)]
    actual: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl CsvRow {
    fn into_entry(self) -> PaymentHistoryEntry {
        // Empty cells are absent fields, not empty strings
        fn cell(value: Option<String>) -> Option<String> {
            value.filter(|s| !s.trim().is_empty())
        }

        PaymentHistoryEntry {
            id: cell(self.id),
            date: cell(self.date).map(Value::String),
            label: cell(self.label),
            required: cell(self.required).map(Value::String),
            actual: cell(self.actual).map(Value::String),
            notes: cell(self.notes),
            ..Default::default()
        }
    }
}

/// Load payment history from CSV with columns `id,date,label,required,actual,notes`
pub fn load_history_csv_from_reader<R: Read>(reader: R) -> Result<Vec<PaymentHistoryEntry>, RecordError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut entries = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        entries.push(row.into_entry());
    }

    Ok(entries)
}

/// Load payment history, choosing the format from the file extension
pub fn load_history<P: AsRef<Path>>(path: P) -> Result<Vec<PaymentHistoryEntry>, RecordError> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let file = File::open(path)?;
        load_history_csv_from_reader(BufReader::new(file))
    } else {
        load_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_single_and_array() {
        let one: Vec<SimulationRecord> =
            load_json_from_reader(r#"{"userId": "u1", "projectId": "p1"}"#.as_bytes()).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].user_id, "u1");

        let many: Vec<ProjectRecord> =
            load_json_from_reader(r#"[{"id": "p1"}, {"id": "p2", "name": "Bosque"}]"#.as_bytes())
                .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].name, "Bosque");
    }

    #[test]
    fn test_load_malformed_json() {
        let result: Result<Vec<SimulationRecord>, _> = load_json_from_reader("{not json".as_bytes());
        assert!(matches!(result, Err(RecordError::Json(_))));
    }

    #[test]
    fn test_load_history_csv() {
        let data = "\
id,date,label,required,actual,notes
h1,2024-01-05,,1500000,1500000,first
h2,,feb 2024,,1400000,
h3,,,,,
";
        let entries = load_history_csv_from_reader(data.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].id.as_deref(), Some("h1"));
        assert_eq!(entries[0].required_amount(), Some(1_500_000.0));
        assert_eq!(entries[0].notes.as_deref(), Some("first"));

        assert!(entries[1].date.is_none());
        assert_eq!(entries[1].label.as_deref(), Some("feb 2024"));
        assert_eq!(entries[1].paid_amount(), 1_400_000.0);

        assert_eq!(entries[2].paid_amount(), 0.0);
        assert!(entries[2].label.is_none());
    }
}
