use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Map;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::models::attendance::PresentRecord;
use crate::models::student::{Device, Student};
use crate::services::attendance_api::{ApiError, AttendanceClient};
use crate::services::filter::{class_counts, ClassCount};

/// Cached students and devices, reloaded from the attendance service.
pub struct Roster {
    api: Arc<AttendanceClient>,
    students: RwLock<Vec<Student>>,
    devices: RwLock<Vec<Device>>,
    class_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_students: usize,
    pub enrolled_students: usize,
    pub devices_total: usize,
    pub devices_online: usize,
    pub class_counts: Vec<ClassCount>,
}

impl Roster {
    pub fn new(api: Arc<AttendanceClient>, class_names: Vec<String>) -> Self {
        Self {
            api,
            students: RwLock::new(Vec::new()),
            devices: RwLock::new(Vec::new()),
            class_names,
        }
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub async fn reload_students(&self) -> Result<usize, ApiError> {
        let students = self.api.list_students().await.inspect_err(|e| {
            metrics::counter!("roster_reload_failures_total", "list" => "students").increment(1);
            warn!(error = %e, "Failed to load students");
        })?;
        let count = students.len();
        *self.students.write().unwrap_or_else(PoisonError::into_inner) = students;
        info!(count, "Student list reloaded");
        Ok(count)
    }

    pub async fn reload_devices(&self) -> Result<usize, ApiError> {
        let devices = self.api.list_devices().await.inspect_err(|e| {
            metrics::counter!("roster_reload_failures_total", "list" => "devices").increment(1);
            warn!(error = %e, "Failed to load devices");
        })?;
        let count = devices.len();
        *self.devices.write().unwrap_or_else(PoisonError::into_inner) = devices;
        Ok(count)
    }

    pub fn students(&self) -> Vec<Student> {
        self.students
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn student(&self, roll_no: u32) -> Option<Student> {
        self.students
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.roll_no == roll_no)
            .cloned()
    }

    pub fn summary(&self) -> DashboardSummary {
        let students = self.students();
        let devices = self.devices();
        DashboardSummary {
            total_students: students.len(),
            enrolled_students: students.iter().filter(|s| s.fingerprint_enrolled).count(),
            devices_total: devices.len(),
            devices_online: devices.iter().filter(|d| d.is_online).count(),
            class_counts: class_counts(&students, &self.class_names),
        }
    }

    /// Present list for `date`.
    ///
    /// If the service answers with an error status the list is derived from
    /// cached students with an enrolled fingerprint. Transport errors are
    /// returned as-is.
    pub async fn present_for(&self, date: NaiveDate) -> Result<Vec<PresentRecord>, ApiError> {
        match self.api.list_present(date).await {
            Ok(records) => Ok(records),
            Err(e) if e.is_rejection() => {
                warn!(error = %e, %date, "Present list unavailable, using enrolled students");
                Ok(enrolled_as_present(&self.students()))
            }
            Err(e) => Err(e),
        }
    }
}

fn enrolled_as_present(students: &[Student]) -> Vec<PresentRecord> {
    students
        .iter()
        .filter(|s| s.fingerprint_enrolled)
        .map(|s| PresentRecord {
            roll_no: s.roll_no,
            student_name: s.student_name.clone(),
            class_name: Some(s.class_name.clone()),
            extra: Map::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::command::OpaqueId;

    #[test]
    fn test_enrolled_as_present_keeps_only_enrolled() {
        let students = vec![
            Student {
                roll_no: 1,
                student_name: "Asha".to_string(),
                class_name: "9-A".to_string(),
                identifier_code: None,
                fingerprint_enrolled: true,
                fingerprint_id: Some(OpaqueId::new("4")),
            },
            Student {
                roll_no: 2,
                student_name: "Ravi".to_string(),
                class_name: "9-A".to_string(),
                identifier_code: None,
                fingerprint_enrolled: false,
                fingerprint_id: None,
            },
        ];
        let present = enrolled_as_present(&students);
        assert_eq!(present.len(), 1);
        assert_eq!(present[0].roll_no, 1);
        assert_eq!(present[0].class_name.as_deref(), Some("9-A"));
    }
}
