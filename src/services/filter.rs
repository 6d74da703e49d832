use serde::{Deserialize, Serialize};

use crate::models::attendance::AttendanceRow;

/// Class and free-text filter applied to student/attendance lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterFilter {
    /// Exact class name; "all" or empty means no class filter.
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    /// Case-insensitive name match, or substring of the roll number.
    #[serde(default)]
    pub search: Option<String>,
}

impl RosterFilter {
    pub fn class(&self) -> Option<&str> {
        self.class_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches<T: AttendanceRow>(&self, row: &T) -> bool {
        if let Some(class) = self.class() {
            if row.class_name() != Some(class) {
                return false;
            }
        }

        match self.search_term() {
            Some(term) => {
                row.student_name().to_lowercase().contains(&term)
                    || row.roll_no().to_string().contains(&term)
            }
            None => true,
        }
    }

    pub fn apply<T: AttendanceRow + Clone>(&self, rows: &[T]) -> Vec<T> {
        rows.iter().filter(|row| self.matches(*row)).cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassCount {
    pub class_name: String,
    pub count: usize,
}

/// Rows per class, in the order of `classes`; unlisted classes are ignored.
pub fn class_counts<T: AttendanceRow>(rows: &[T], classes: &[String]) -> Vec<ClassCount> {
    classes
        .iter()
        .map(|class_name| ClassCount {
            class_name: class_name.clone(),
            count: rows
                .iter()
                .filter(|row| row.class_name() == Some(class_name.as_str()))
                .count(),
        })
        .collect()
}
