//! CSV snapshot of the currently filtered list.
//!
//! Headers are the keys of the first record in field order; every field is
//! double-quoted with embedded quotes doubled; rows are `\n` separated.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExportKind {
    Present,
    Absent,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No data to download")]
    Empty,

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let Some(first) = rows.first() else {
        return Err(ExportError::Empty);
    };

    let headers: Vec<String> = match serde_json::to_value(first)? {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => return Err(ExportError::NotAnObject),
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));

    for row in rows {
        let Value::Object(map) = serde_json::to_value(row)? else {
            return Err(ExportError::NotAnObject);
        };
        let fields: Vec<String> = headers
            .iter()
            .map(|h| quote(&cell(map.get(h))))
            .collect();
        lines.push(fields.join(","));
    }

    Ok(lines.join("\n"))
}

/// `present-10-A-2026-10-19.csv`, `absent-all-2026-10-19.csv`
pub fn file_name(kind: ExportKind, class_name: Option<&str>, date: NaiveDate) -> String {
    format!(
        "{}-{}-{}.csv",
        kind,
        class_name.unwrap_or("all"),
        date.format("%Y-%m-%d")
    )
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
