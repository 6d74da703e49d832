use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields shared by present/absent rows, used for filtering and counts.
pub trait AttendanceRow {
    fn roll_no(&self) -> u32;
    fn student_name(&self) -> &str;
    fn class_name(&self) -> Option<&str>;
}

/// Row of GET /attendance/absent/. `message` is the text to send the parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbsentRecord {
    pub roll_no: u32,
    pub student_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of GET /attendance/present/.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresentRecord {
    pub roll_no: u32,
    pub student_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceRow for AbsentRecord {
    fn roll_no(&self) -> u32 {
        self.roll_no
    }

    fn student_name(&self) -> &str {
        &self.student_name
    }

    fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }
}

impl AttendanceRow for PresentRecord {
    fn roll_no(&self) -> u32 {
        self.roll_no
    }

    fn student_name(&self) -> &str {
        &self.student_name
    }

    fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }
}

impl AttendanceRow for crate::models::student::Student {
    fn roll_no(&self) -> u32 {
        self.roll_no
    }

    fn student_name(&self) -> &str {
        &self.student_name
    }

    fn class_name(&self) -> Option<&str> {
        Some(&self.class_name)
    }
}

/// POST /attendance/finalize/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeReport {
    pub message: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_record_keeps_extra_fields_in_order() {
        let record: AbsentRecord = serde_json::from_str(
            r#"{"roll_no": 4, "student_name": "Meera", "contact": "9876543210",
                "message": "Dear Parent, Your child Meera was absent on 2026-10-19.",
                "parent_name": "Sunil"}"#,
        )
        .unwrap();
        assert_eq!(record.extra.get("parent_name"), Some(&Value::from("Sunil")));
        assert!(record.class_name.is_none());

        let keys: Vec<String> = match serde_json::to_value(&record).unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => unreachable!(),
        };
        assert_eq!(
            keys,
            vec!["roll_no", "student_name", "contact", "message", "parent_name"]
        );
    }

    #[test]
    fn test_finalize_report_date_optional() {
        let report: FinalizeReport =
            serde_json::from_str(r#"{"message": "Attendance finalized"}"#).unwrap();
        assert!(report.date.is_none());

        let report: FinalizeReport =
            serde_json::from_str(r#"{"message": "ok", "date": "2026-10-19"}"#).unwrap();
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2026, 10, 19));
    }
}
